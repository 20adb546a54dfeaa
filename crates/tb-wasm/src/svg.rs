//! Connector overlay as a standalone SVG document.

use std::fmt::Write;
use tb_core::ConnectorConfig;
use tb_render::Connector;

pub fn render_svg(
    connectors: &[Connector],
    config: &ConnectorConfig,
    width: f64,
    height: f64,
) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let dash = format!("{} {}", config.dash[0], config.dash[1]);
    for conn in connectors {
        let color = conn.kind.accent_hex();
        let _ = writeln!(
            svg,
            r#"  <path d="{}" fill="none" stroke="{color}" stroke-width="{}" stroke-dasharray="{dash}" stroke-linecap="round" opacity="{}" data-item="{}"/>"#,
            conn.svg_path(),
            config.stroke_width,
            config.opacity,
            conn.item,
        );
        let _ = writeln!(
            svg,
            r#"  <circle cx="{}" cy="{}" r="{}" fill="{color}" opacity="{}"/>"#,
            conn.marker.x, conn.marker.y, config.dot_radius, config.opacity,
        );
    }
    svg.push_str("</svg>\n");
    svg
}
