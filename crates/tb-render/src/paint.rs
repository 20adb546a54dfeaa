//! Connectors → Vello drawing commands.
//!
//! Each connector is a dashed stroke in its item kind's accent colour,
//! finished with a filled dot on the marker.

use crate::connector::Connector;
use kurbo::{Affine, Cap, Stroke as KurboStroke};
use peniko::{Color, Fill};
use tb_core::{ConnectorConfig, ItemKind};
use vello::Scene;

/// Paint all connectors into a Vello scene.
///
/// Call once per frame after the items themselves, so connectors overlay them.
pub fn paint_connectors(scene: &mut Scene, connectors: &[Connector], config: &ConnectorConfig) {
    let stroke = connector_stroke(config);
    for conn in connectors {
        let color = kind_color(conn.kind, config.opacity);
        scene.stroke(&stroke, Affine::IDENTITY, color, None, &conn.bez_path());
        scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            color,
            None,
            &conn.dot(config.dot_radius),
        );
    }
}

pub fn connector_stroke(config: &ConnectorConfig) -> KurboStroke {
    KurboStroke::new(config.stroke_width)
        .with_caps(Cap::Round)
        .with_dashes(0.0, config.dash)
}

fn kind_color(kind: ItemKind, opacity: f64) -> Color {
    let (r, g, b) = kind.accent_rgb();
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::from_rgba8(r, g, b, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::{ItemId, Point};

    #[test]
    fn stroke_follows_config() {
        let config = ConnectorConfig::default();
        let stroke = connector_stroke(&config);
        assert_eq!(stroke.width, 1.5);
        assert_eq!(stroke.dash_pattern.as_slice(), &[5.0, 5.0]);
    }

    #[test]
    fn painting_connectors_does_not_panic() {
        let conn = Connector {
            item: ItemId::intern("paint-1"),
            kind: ItemKind::Image,
            anchor: Point::new(10.0, 300.0),
            marker: Point::new(200.0, 111.0),
            control: Point::new(120.0, 190.0),
            is_above: false,
        };
        let mut scene = Scene::new();
        paint_connectors(&mut scene, &[conn], &ConnectorConfig::default());
    }
}
