//! Connector geometry: item anchor → bound date marker.
//!
//! A connector is a single quadratic Bézier. Its control point keeps the
//! chord midpoint's x and is pushed vertically by a bend scaled from the
//! vertical distance and clamped to `[min_bend, max_bend]`: downward when
//! the item is above its marker, upward when below. The bend is capped at
//! half the vertical span so the control point stays between the two
//! endpoints. Level endpoints give a straight line.

use kurbo::{BezPath, Circle, QuadBez};
use tb_core::{AnchorMode, Bounds, ConnectorConfig, DateMarker, Item, ItemId, ItemKind, Point};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    pub item: ItemId,
    pub kind: ItemKind,
    pub anchor: Point,
    pub marker: Point,
    pub control: Point,
    /// The anchor is above (smaller y than) the marker.
    pub is_above: bool,
}

impl Connector {
    pub fn quad(&self) -> QuadBez {
        QuadBez::new(
            (self.anchor.x, self.anchor.y),
            (self.control.x, self.control.y),
            (self.marker.x, self.marker.y),
        )
    }

    pub fn bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to((self.anchor.x, self.anchor.y));
        path.quad_to(
            (self.control.x, self.control.y),
            (self.marker.x, self.marker.y),
        );
        path
    }

    /// SVG `d` attribute for the curve.
    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} Q {} {} {} {}",
            self.anchor.x,
            self.anchor.y,
            self.control.x,
            self.control.y,
            self.marker.x,
            self.marker.y
        )
    }

    /// Terminal dot at the marker end.
    pub fn dot(&self, radius: f64) -> Circle {
        Circle::new((self.marker.x, self.marker.y), radius)
    }
}

/// Reference point on an item's rendered box.
pub fn anchor_point(bounds: &Bounds, mode: AnchorMode) -> Point {
    match mode {
        AnchorMode::TopCenter => bounds.top_center(),
        AnchorMode::Center => bounds.center(),
    }
}

/// Control point for the curve `anchor → marker`, plus the orientation.
pub fn control_point(anchor: Point, marker: Point, config: &ConnectorConfig) -> (Point, bool) {
    let is_above = anchor.y < marker.y;
    let mid = anchor.midpoint(marker);
    let span = (marker.y - anchor.y).abs();
    if span < EPS {
        return (mid, is_above);
    }

    let min = config.min_bend.min(config.max_bend);
    let bend = (span * config.bend_factor)
        .clamp(min, config.max_bend)
        .min(span / 2.0);
    let dy = if is_above { bend } else { -bend };
    (mid.offset(0.0, dy), is_above)
}

/// Build the connector of `item` whose measured box is `bounds`.
pub fn build_connector(
    item: &Item,
    bounds: &Bounds,
    marker: &DateMarker,
    config: &ConnectorConfig,
) -> Connector {
    let anchor = anchor_point(bounds, config.anchor);
    let end = Point::new(marker.center_x, marker.y);
    let (control, is_above) = control_point(anchor, end, config);
    Connector {
        item: item.id(),
        kind: item.kind(),
        anchor,
        marker: end,
        control,
        is_above,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::{ItemContent, NaiveDate, Size};

    fn cfg() -> ConnectorConfig {
        ConnectorConfig::default()
    }

    #[test]
    fn above_marker_bows_downward_within_span() {
        let anchor = Point::new(100.0, 400.0);
        let marker = Point::new(300.0, 111.0);
        // anchor below marker here; flip for the "above" case
        let (c, above) = control_point(marker, anchor, &cfg());
        assert!(above);
        let mid = marker.midpoint(anchor);
        assert!(c.y > mid.y, "control {c:?} should sit below midpoint {mid:?}");
        assert!(c.y >= marker.y && c.y <= anchor.y);
    }

    #[test]
    fn below_marker_bows_upward_within_span() {
        let anchor = Point::new(100.0, 400.0);
        let marker = Point::new(300.0, 111.0);
        let (c, above) = control_point(anchor, marker, &cfg());
        assert!(!above);
        let mid = anchor.midpoint(marker);
        assert!(c.y < mid.y);
        assert!(c.y >= marker.y && c.y <= anchor.y);
    }

    #[test]
    fn vertical_chord_bows_vertically() {
        let a = Point::new(100.0, 0.0);
        let b = Point::new(100.0, 300.0);
        let (c, above) = control_point(a, b, &cfg());
        assert!(above);
        // 0.2 of the 300 px span, pushed down from the midpoint
        assert_eq!(c.x, 100.0);
        assert!((c.y - 210.0).abs() < 1e-9, "control {c:?}");

        let (c, above) = control_point(b, a, &cfg());
        assert!(!above);
        assert_eq!(c.x, 100.0);
        assert!((c.y - 90.0).abs() < 1e-9, "control {c:?}");
    }

    #[test]
    fn control_x_stays_on_the_midpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(200.0, 300.0);
        let (c, _) = control_point(a, b, &cfg());
        assert_eq!(c.x, 100.0);
    }

    #[test]
    fn bend_is_clamped() {
        let config = cfg();
        // Very far apart vertically: bend capped at max_bend.
        let a = Point::new(0.0, 0.0);
        let b = Point::new(5000.0, 5000.0);
        let (c, _) = control_point(a, b, &config);
        let off = c.y - a.midpoint(b).y;
        assert!((off - config.max_bend).abs() < 1e-6, "offset {off}");

        // Close together: at least min_bend (span permitting).
        let b = Point::new(10.0, 30.0);
        let (c, _) = control_point(a, b, &config);
        let off = c.y - a.midpoint(b).y;
        assert!((off - config.min_bend).abs() < 1e-6, "offset {off}");
    }

    #[test]
    fn level_endpoints_give_a_straight_line() {
        let a = Point::new(0.0, 50.0);
        let b = Point::new(300.0, 50.0);
        let (c, above) = control_point(a, b, &cfg());
        assert!(!above);
        assert_eq!(c, a.midpoint(b));
    }

    #[test]
    fn coincident_endpoints_do_not_produce_nan() {
        let p = Point::new(7.0, 7.0);
        let (c, _) = control_point(p, p, &cfg());
        assert_eq!(c, p);
    }

    #[test]
    fn connector_uses_top_center_anchor_and_marker_point() {
        let item = Item::new(
            ItemId::intern("conn-1"),
            ItemContent::default_for(ItemKind::Event),
            Point::new(100.0, 300.0),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        let bounds = Bounds::from_origin_size(item.position, Size::new(180.0, 80.0));
        let marker = DateMarker {
            date: item.bound_date,
            center_x: 420.0,
            y: 111.0,
        };
        let conn = build_connector(&item, &bounds, &marker, &cfg());
        assert_eq!(conn.anchor, Point::new(190.0, 300.0));
        assert_eq!(conn.marker, Point::new(420.0, 111.0));
        assert_eq!(conn.kind, ItemKind::Event);
        assert!(conn.svg_path().starts_with("M 190 300 Q "));
        assert!(conn.svg_path().ends_with(" 420 111"));
        assert_eq!(conn.dot(5.0).radius, 5.0);
    }
}
