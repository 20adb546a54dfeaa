//! Canvas2D connector overlay.
//!
//! Items are DOM elements owned by the host page; this canvas sits on top
//! of them (pointer-events disabled) and only carries the connectors and
//! the marker dots.

use std::f64::consts::TAU;
use tb_core::ConnectorConfig;
use tb_render::Connector;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

/// Theme-dependent colors for the overlay.
pub struct CanvasTheme {
    /// Ring drawn around each marker dot so it reads on the timeline strip.
    pub dot_ring: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self { dot_ring: "#FFFFFF" }
    }

    pub fn dark() -> Self {
        Self { dot_ring: "#1C1C1E" }
    }
}

/// Clear the overlay and draw every connector.
pub fn render_connectors(
    ctx: &CanvasRenderingContext2d,
    connectors: &[Connector],
    config: &ConnectorConfig,
    canvas_width: f64,
    canvas_height: f64,
    theme: &CanvasTheme,
) {
    ctx.clear_rect(0.0, 0.0, canvas_width, canvas_height);
    let dash = js_sys::Array::new();
    for segment in config.dash {
        dash.push(&JsValue::from_f64(segment));
    }
    for conn in connectors {
        draw_connector(ctx, conn, config, &dash, theme);
    }
}

fn draw_connector(
    ctx: &CanvasRenderingContext2d,
    conn: &Connector,
    config: &ConnectorConfig,
    dash: &js_sys::Array,
    theme: &CanvasTheme,
) {
    let color = conn.kind.accent_hex();

    ctx.save();
    ctx.set_global_alpha(config.opacity);
    ctx.set_stroke_style_str(&color);
    ctx.set_line_width(config.stroke_width);
    ctx.set_line_cap("round");
    let _ = ctx.set_line_dash(dash);

    ctx.begin_path();
    ctx.move_to(conn.anchor.x, conn.anchor.y);
    ctx.quadratic_curve_to(conn.control.x, conn.control.y, conn.marker.x, conn.marker.y);
    ctx.stroke();

    // Dot: solid, no dash.
    let _ = ctx.set_line_dash(&js_sys::Array::new());
    ctx.begin_path();
    if ctx
        .arc(conn.marker.x, conn.marker.y, config.dot_radius, 0.0, TAU)
        .is_ok()
    {
        ctx.set_fill_style_str(&color);
        ctx.fill();
        ctx.set_stroke_style_str(theme.dot_ring);
        ctx.set_line_width(1.0);
        ctx.stroke();
    }
    ctx.restore();
}
