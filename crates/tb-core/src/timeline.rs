//! Rolling timeline window.
//!
//! The window is a contiguous run of calendar days, initially around
//! "today". Scrolling near either edge extends it by a batch of days; it
//! never shrinks. Marker positions are derived from the scroll offset on
//! every call and are not part of a day's identity.

use crate::binding::DateMarker;
use crate::config::TimelineConfig;
use chrono::{Days, NaiveDate};

/// One materialized day of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_today: bool,
}

impl CalendarDay {
    /// `2024-06-03`, also the DOM tag of the day element.
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `Mon`
    pub fn weekday_label(&self) -> String {
        self.date.format("%a").to_string()
    }

    /// `Jun 3`
    pub fn date_label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// A window extension triggered by a scroll report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extension {
    pub edge: Edge,
    pub days: u32,
    /// Pixels added to the scroll offset so the focused day stays put.
    pub scroll_compensation: f64,
}

/// Result of [`Timeline::on_scroll`]: the offset the host should apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOutcome {
    pub scroll_left: f64,
    pub extension: Option<Extension>,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    start: NaiveDate,
    len: u32,
    today: NaiveDate,
    scroll_left: f64,
    client_width: f64,
    /// Board x of the timeline container's left edge.
    origin_x: f64,
    config: TimelineConfig,
}

impl Timeline {
    /// Initial window: `days_before` days before `today`, `initial_days` long.
    pub fn centered_on(today: NaiveDate, config: TimelineConfig) -> Self {
        let start = today
            .checked_sub_days(Days::new(config.days_before as u64))
            .unwrap_or(today);
        Self {
            start,
            len: config.initial_days.max(1),
            today,
            scroll_left: 0.0,
            client_width: 0.0,
            origin_x: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> NaiveDate {
        self.start
    }

    pub fn last(&self) -> NaiveDate {
        self.start + Days::new(self.len as u64 - 1)
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first() && date <= self.last()
    }

    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    pub fn content_width(&self) -> f64 {
        self.len as f64 * self.config.day_width
    }

    pub fn set_origin_x(&mut self, origin_x: f64) {
        self.origin_x = origin_x;
    }

    pub fn set_client_width(&mut self, client_width: f64) {
        self.client_width = client_width.max(0.0);
    }

    /// All materialized days, oldest first.
    pub fn days(&self) -> impl Iterator<Item = CalendarDay> + '_ {
        self.start
            .iter_days()
            .take(self.len as usize)
            .map(|date| CalendarDay {
                date,
                is_today: date == self.today,
            })
    }

    /// Days whose column overlaps the visible part of the container.
    pub fn visible_days(&self) -> impl Iterator<Item = CalendarDay> + '_ {
        let dw = self.config.day_width;
        let lo = self.scroll_left;
        let hi = self.scroll_left + self.client_width;
        self.days().enumerate().filter_map(move |(i, day)| {
            let left = i as f64 * dw;
            (left + dw > lo && left < hi).then_some(day)
        })
    }

    /// Scroll the window so `date`'s column is centered, if materialized.
    pub fn scroll_to(&mut self, date: NaiveDate) -> Option<f64> {
        let idx = self.index_of(date)?;
        let dw = self.config.day_width;
        let target = idx as f64 * dw + dw / 2.0 - self.client_width / 2.0;
        self.scroll_left = target.clamp(0.0, (self.content_width() - self.client_width).max(0.0));
        Some(self.scroll_left)
    }

    /// Handle a scroll report from the container.
    ///
    /// At most one extension happens per report. Prepending shifts existing
    /// columns right, so the returned `scroll_left` includes the batch width.
    pub fn on_scroll(&mut self, scroll_left: f64, client_width: f64) -> ScrollOutcome {
        self.scroll_left = scroll_left.max(0.0);
        self.set_client_width(client_width);

        let threshold = self.config.edge_threshold;
        let batch = self.config.batch_days;
        let tail_gap = self.content_width() - (self.scroll_left + self.client_width);

        let extension = if self.scroll_left < threshold {
            self.extend_backward(batch).map(|days| {
                let compensation = days as f64 * self.config.day_width;
                self.scroll_left += compensation;
                Extension {
                    edge: Edge::Start,
                    days,
                    scroll_compensation: compensation,
                }
            })
        } else if tail_gap < threshold {
            self.extend_forward(batch).map(|days| Extension {
                edge: Edge::End,
                days,
                scroll_compensation: 0.0,
            })
        } else {
            None
        };

        if let Some(ext) = extension {
            log::info!(
                "timeline extended by {} day(s) at {:?}; window {}..={}",
                ext.days,
                ext.edge,
                self.first(),
                self.last()
            );
        }

        ScrollOutcome {
            scroll_left: self.scroll_left,
            extension,
        }
    }

    /// Prepend `days` days. Returns the number added (`None` at chrono's range limit).
    pub fn extend_backward(&mut self, days: u32) -> Option<u32> {
        if days == 0 {
            return None;
        }
        let start = self.start.checked_sub_days(Days::new(days as u64))?;
        self.start = start;
        self.len += days;
        Some(days)
    }

    /// Append `days` days.
    pub fn extend_forward(&mut self, days: u32) -> Option<u32> {
        if days == 0 {
            return None;
        }
        self.last().checked_add_days(Days::new(days as u64))?;
        self.len += days;
        Some(days)
    }

    /// Current on-screen markers for every materialized day.
    pub fn markers(&self) -> Vec<DateMarker> {
        self.days()
            .enumerate()
            .map(|(i, day)| self.marker_at(i, day.date))
            .collect()
    }

    /// Current marker of `date`, if that day is materialized.
    pub fn marker_for(&self, date: NaiveDate) -> Option<DateMarker> {
        self.index_of(date).map(|i| self.marker_at(i, date))
    }

    fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.contains(date).then(|| (date - self.start).num_days() as usize)
    }

    fn marker_at(&self, index: usize, date: NaiveDate) -> DateMarker {
        let dw = self.config.day_width;
        DateMarker {
            date,
            center_x: self.origin_x + index as f64 * dw + dw / 2.0 - self.scroll_left,
            y: self.config.baseline_y + self.config.marker_drop,
        }
    }
}
