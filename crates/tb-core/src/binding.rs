//! Date binding: which calendar day is an item attached to?
//!
//! Binding is purely horizontal. The timeline is a 1-D axis, so an item's
//! vertical placement never influences the day it binds to.

use chrono::NaiveDate;

/// A rendered day marker: the day plus its current on-screen position.
///
/// `center_x` is the horizontal center of the day's column, `y` the point
/// connectors attach to. Both are derived every layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateMarker {
    pub date: NaiveDate,
    pub center_x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("no date markers are rendered yet")]
    NoMarkersAvailable,
}

/// Find the date whose marker center is horizontally closest to `x`.
///
/// Ties go to the first marker encountered.
pub fn find_closest_date<'a, I>(x: f64, markers: I) -> Result<NaiveDate, BindingError>
where
    I: IntoIterator<Item = &'a DateMarker>,
{
    let mut best: Option<(f64, NaiveDate)> = None;
    for marker in markers {
        let d = (marker.center_x - x).abs();
        match best {
            Some((best_d, _)) if d >= best_d => {}
            _ => best = Some((d, marker.date)),
        }
    }
    best.map(|(_, date)| date).ok_or(BindingError::NoMarkersAvailable)
}

/// Binding with the documented fallback: keep `previous` when no markers exist.
pub fn resolve_binding(x: f64, markers: &[DateMarker], previous: NaiveDate) -> NaiveDate {
    match find_closest_date(x, markers) {
        Ok(date) => date,
        Err(BindingError::NoMarkersAvailable) => {
            log::debug!("no markers at x={x}; keeping binding {previous}");
            previous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn markers() -> Vec<DateMarker> {
        [(1, 50.0), (2, 200.0), (3, 400.0)]
            .into_iter()
            .map(|(d, x)| DateMarker {
                date: day(d),
                center_x: x,
                y: 0.0,
            })
            .collect()
    }

    #[test]
    fn picks_nearest_marker() {
        assert_eq!(find_closest_date(210.0, &markers()), Ok(day(2)));
        assert_eq!(find_closest_date(-1000.0, &markers()), Ok(day(1)));
        assert_eq!(find_closest_date(9000.0, &markers()), Ok(day(3)));
    }

    #[test]
    fn midpoint_tie_goes_to_first_listed() {
        assert_eq!(find_closest_date(125.0, &markers()), Ok(day(1)));
        assert_eq!(find_closest_date(300.0, &markers()), Ok(day(2)));
    }

    #[test]
    fn order_of_markers_does_not_matter_for_unique_minimum() {
        let mut reversed = markers();
        reversed.reverse();
        assert_eq!(find_closest_date(390.0, &reversed), Ok(day(3)));
    }

    #[test]
    fn empty_marker_set_fails_cleanly() {
        assert_eq!(
            find_closest_date(10.0, &[]),
            Err(BindingError::NoMarkersAvailable)
        );
    }

    #[test]
    fn fallback_keeps_previous_binding() {
        assert_eq!(resolve_binding(10.0, &[], day(9)), day(9));
        assert_eq!(resolve_binding(410.0, &markers(), day(9)), day(3));
    }
}
