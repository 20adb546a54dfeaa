//! Integration tests: rolling window invariants under scroll sequences.

use tb_core::config::TimelineConfig;
use tb_core::timeline::{Edge, Timeline};
use tb_core::NaiveDate;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
}

fn assert_contiguous(timeline: &Timeline) {
    let days: Vec<NaiveDate> = timeline.days().map(|d| d.date).collect();
    assert_eq!(days.len(), timeline.len());
    assert_eq!(days.first().copied(), Some(timeline.first()));
    assert_eq!(days.last().copied(), Some(timeline.last()));
    for pair in days.windows(2) {
        assert_eq!(
            pair[0].succ_opt(),
            Some(pair[1]),
            "gap between {} and {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn window_never_shrinks_and_stays_contiguous() {
    let mut timeline = Timeline::centered_on(today(), TimelineConfig::default());
    let client = 900.0;

    // A jittery scroll sequence that hits both edges repeatedly.
    let mut reports = Vec::new();
    for i in 0..60 {
        let wobble = (i * 37 % 11) as f64 * 10.0;
        reports.push(if i % 3 == 0 { wobble } else { 1.0e6 });
        reports.push(2500.0 + wobble * 5.0);
    }

    let mut last_len = timeline.len();
    for report in reports {
        // Clamp like a browser would.
        let max = (timeline.content_width() - client).max(0.0);
        timeline.on_scroll(report.min(max), client);

        assert!(timeline.len() >= last_len, "window shrank");
        last_len = timeline.len();
        assert_contiguous(&timeline);
        assert!(timeline.contains(today()));
    }
    assert!(last_len > 45);
}

#[test]
fn each_extension_adds_exactly_one_batch() {
    let config = TimelineConfig {
        batch_days: 7,
        ..TimelineConfig::default()
    };
    let mut timeline = Timeline::centered_on(today(), config);

    let out = timeline.on_scroll(0.0, 600.0);
    let ext = out.extension.unwrap();
    assert_eq!((ext.edge, ext.days), (Edge::Start, 7));
    assert_eq!(timeline.len(), 52);
    assert_eq!(out.scroll_left, 7.0 * 140.0);
}

#[test]
fn narrow_window_prefers_the_start_edge() {
    // Content narrower than the viewport: both edges are "near".
    let config = TimelineConfig {
        initial_days: 2,
        days_before: 1,
        ..TimelineConfig::default()
    };
    let mut timeline = Timeline::centered_on(today(), config);
    let out = timeline.on_scroll(0.0, 1200.0);
    assert_eq!(out.extension.map(|e| e.edge), Some(Edge::Start));
    assert_contiguous(&timeline);
}
