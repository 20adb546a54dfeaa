//! WASM bridge for Tetherboard: exposes the board engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host page renders the
//! items and the timeline strip as DOM, forwards pointer and scroll events
//! here, and draws the connector overlay through [`BoardCanvas::render`].

mod bridge;
mod logger;
mod render2d;
mod svg;

pub use bridge::{HostBridge, HostRequest};

use serde_json::json;
use tb_core::{
    BoardConfig, Item, ItemContent, ItemId, ItemKind, NaiveDate, Point, Size, Viewport,
    parse_iso_date,
};
use tb_editor::board::Board;
use tb_editor::input::InputEvent;
use tb_editor::store::StoreError;
use tb_render::RedrawReason;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing board controller.
///
/// Holds the board (store, timeline, drag, connectors) over a
/// [`HostBridge`]. All interaction from the page goes through this struct.
#[wasm_bindgen]
pub struct BoardCanvas {
    board: Board<HostBridge>,
    /// Dark mode flag: `false` = light (default), `true` = dark.
    dark_mode: bool,
}

#[wasm_bindgen]
impl BoardCanvas {
    /// Create a board from a JSON config (may be empty) and today's ISO
    /// date (empty: the browser's local date).
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: &str,
        today_iso: &str,
        width: f64,
        height: f64,
    ) -> Result<BoardCanvas, JsValue> {
        console_error_panic_hook_setup();
        logger::init(log::LevelFilter::Info);

        let config = BoardConfig::from_json(config_json).map_err(to_js)?;
        let today = if today_iso.trim().is_empty() {
            local_today()
        } else {
            parse_iso_date(today_iso).map_err(to_js)?
        };
        log::info!("board created for {today}");

        Ok(Self {
            board: Board::new(HostBridge::new(), config, today, Viewport { width, height }),
            dark_mode: false,
        })
    }

    /// `error`, `warn`, `info`, `debug`, `trace` or `off`.
    pub fn set_log_level(&self, level: &str) -> bool {
        match level.parse::<log::LevelFilter>() {
            Ok(filter) => {
                log::set_max_level(filter);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.board.resize(Viewport { width, height });
    }

    /// Board x of the timeline container's left edge.
    pub fn set_timeline_origin(&mut self, x: f64) {
        self.board.timeline.set_origin_x(x);
        self.board.connectors.invalidate(RedrawReason::Resized);
    }

    // ─── Items ───────────────────────────────────────────────────────────

    /// Hydrate from the JSON array the host fetched. Returns the count.
    pub fn load_items(&mut self, json: &str) -> Result<usize, JsValue> {
        let items: Vec<Item> = serde_json::from_str(json).map_err(to_js)?;
        self.board.store.backend_mut().seed(items);
        self.board.load(None).map_err(to_js)
    }

    /// All items as a JSON array in wire shape.
    pub fn items_json(&self) -> String {
        serde_json::to_string(self.board.store.items()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Add an item of `kind` (`text`, `task`, `event`, `image`) at (x, y).
    /// Returns the new item as JSON. The item stays on the board even when
    /// the host is offline.
    pub fn add_item(&mut self, kind: &str, x: f64, y: f64) -> Result<String, JsValue> {
        let kind: ItemKind = kind.parse().map_err(to_js)?;
        match self.board.add_item(kind, Point::new(x, y)) {
            Ok(item) => Ok(item.to_json()),
            Err(StoreError::NotPersisted { id, .. }) => self
                .board
                .store
                .get(id)
                .map(Item::to_json)
                .ok_or_else(|| JsValue::from_str("item vanished after create")),
            Err(e) => Err(to_js(e)),
        }
    }

    /// Replace an item's content with the JSON object `content_json`.
    pub fn update_content(&mut self, id: &str, content_json: &str) -> Result<bool, JsValue> {
        let Some(id) = ItemId::lookup(id) else {
            return Ok(false);
        };
        let Some(kind) = self.board.store.get(id).map(Item::kind) else {
            return Ok(false);
        };
        let content = parse_content(kind, content_json)?;
        self.board.update_content(id, content).map_err(to_js)
    }

    pub fn toggle_task(&mut self, id: &str) -> bool {
        ItemId::lookup(id).is_some_and(|id| self.board.toggle_task(id))
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        ItemId::lookup(id).is_some_and(|id| self.board.remove_item(id))
    }

    /// The host measured (or re-measured) an item's element.
    pub fn set_item_size(&mut self, id: &str, width: f64, height: f64) {
        if let Some(id) = ItemId::lookup(id) {
            self.board.set_item_size(id, Size::new(width, height));
        }
    }

    pub fn unmount_item(&mut self, id: &str) {
        if let Some(id) = ItemId::lookup(id) {
            self.board.unmount_item(id);
        }
    }

    /// Current preview position of a dragged item as `[x, y]`, or `""`.
    pub fn visual_position(&self, id: &str) -> String {
        ItemId::lookup(id)
            .and_then(|id| self.board.drag.visual_position(id))
            .map(|p| json!([p.x, p.y]).to_string())
            .unwrap_or_default()
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// Returns true if a drag started.
    pub fn handle_pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.board.handle_event(&InputEvent::from_pointer_down(x, y))
    }

    /// Returns true if the drag preview moved.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.board.handle_event(&InputEvent::from_pointer_move(x, y))
    }

    /// Returns true if a drag was committed.
    pub fn handle_pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.board.handle_event(&InputEvent::from_pointer_up(x, y))
    }

    /// Enter edit mode for the item under the pointer. Returns
    /// `{"id", "type", "content"}` or `""` when nothing was hit.
    pub fn handle_double_click(&mut self, x: f64, y: f64) -> String {
        self.board
            .double_click(x, y)
            .map(|session| {
                json!({
                    "id": session.item.as_str(),
                    "type": session.original.kind().as_str(),
                    "content": session.original.to_value(),
                })
                .to_string()
            })
            .unwrap_or_default()
    }

    /// Finish editing with the JSON content the host collected.
    pub fn commit_edit(&mut self, content_json: &str) -> Result<bool, JsValue> {
        let Some(kind) = self.board.editing().map(|e| e.original.kind()) else {
            return Ok(false);
        };
        let content = parse_content(kind, content_json)?;
        self.board.commit_edit(content).map_err(to_js)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.board.cancel_edit().is_some()
    }

    // ─── Timeline ────────────────────────────────────────────────────────

    /// Scroll report from the timeline container. Returns the scroll
    /// offset the host must apply (changed after a prepend).
    pub fn handle_timeline_scroll(&mut self, scroll_left: f64, client_width: f64) -> f64 {
        self.board
            .on_timeline_scroll(scroll_left, client_width)
            .scroll_left
    }

    /// Materialized days as `[{date, weekday, label, isToday}]`.
    pub fn days_json(&self) -> String {
        let days: Vec<_> = self
            .board
            .timeline
            .days()
            .map(|day| {
                json!({
                    "date": day.iso(),
                    "weekday": day.weekday_label(),
                    "label": day.date_label(),
                    "isToday": day.is_today,
                })
            })
            .collect();
        serde_json::Value::Array(days).to_string()
    }

    /// Center today's column. Returns the new scroll offset.
    pub fn scroll_to_today(&mut self) -> f64 {
        let today = self.board.timeline.today();
        let offset = self.board.timeline.scroll_to(today).unwrap_or(0.0);
        self.board.rebind_all();
        self.board.connectors.invalidate(RedrawReason::TimelineScrolled);
        offset
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Fallback timer. Returns true if `render` should be called.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.board.tick(now_ms)
    }

    pub fn needs_redraw(&self) -> bool {
        self.board.connectors.needs_redraw()
    }

    /// Draw the connector overlay.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        let Viewport { width, height } = self.board.viewport;
        let config = self.board.connectors.config().clone();
        let connectors = self.board.connectors();
        render2d::render_connectors(ctx, connectors, &config, width, height, &theme);
    }

    /// The connector overlay as an SVG document.
    pub fn connectors_svg(&mut self) -> String {
        let Viewport { width, height } = self.board.viewport;
        let config = self.board.connectors.config().clone();
        svg::render_svg(self.board.connectors(), &config, width, height)
    }

    // ─── Persistence bridge ──────────────────────────────────────────────

    /// Push queued writes into the bridge. Returns the flush report JSON.
    pub fn flush(&mut self) -> String {
        let report = self.board.flush();
        json!({
            "written": report.written,
            "retrying": report.retrying,
            "dropped": report.dropped,
        })
        .to_string()
    }

    /// Drain the HTTP requests the host should perform, as a JSON array
    /// of `{op, method, path, body}`.
    pub fn take_writes(&mut self) -> String {
        let requests: Vec<_> = self
            .board
            .store
            .backend_mut()
            .take_requests()
            .iter()
            .map(HostRequest::to_value)
            .collect();
        serde_json::Value::Array(requests).to_string()
    }

    /// Merge the server's create response (item JSON with metadata).
    pub fn ack_create(&mut self, json: &str) -> Result<bool, JsValue> {
        let saved = Item::from_json(json).map_err(to_js)?;
        self.board.store.backend_mut().acknowledge(&saved);
        Ok(self.board.store.acknowledge(&saved))
    }

    /// The host's fetches started failing (or recovered).
    pub fn set_online(&mut self, online: bool) {
        self.board.store.backend_mut().set_online(online);
    }
}

fn parse_content(kind: ItemKind, json: &str) -> Result<ItemContent, JsValue> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(to_js)?;
    ItemContent::from_value(kind, value).map_err(to_js)
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn local_today() -> NaiveDate {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .unwrap_or_default()
}

/// Set up a panic hook that logs to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Tetherboard WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
