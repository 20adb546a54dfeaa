//! Board orchestration.
//!
//! The board wires the store, the rolling timeline, the drag controller
//! and the connector renderer together:
//!
//! - **Pointer → Store**: a press on an item starts a drag, moves only
//!   update the preview, and the release commits one `move`, rebinds the
//!   item to the closest day and invalidates the connectors.
//! - **Timeline → Store**: every scroll report may extend the window,
//!   after which all items are rebound against the new marker positions.
//!
//! Connector redraws funnel through [`ConnectorRenderer::invalidate`] and
//! are rebuilt lazily by [`Board::connectors`].

use crate::drag::{DragCommit, DragController};
use crate::input::InputEvent;
use crate::persist::{OwnerKey, Persistence};
use crate::store::{FlushReport, ItemStore, StoreError};
use std::collections::HashMap;
use tb_core::{
    BoardConfig, Bounds, Item, ItemContent, ItemId, ItemKind, NaiveDate, Point, ScrollOutcome,
    Size, Timeline, Viewport, resolve_binding,
};
use tb_render::hit::hit_test;
use tb_render::{Connector, ConnectorRenderer, RedrawReason};

/// A store-level change produced by interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardMutation {
    MoveItem { id: ItemId, x: f64, y: f64 },
    UpdateContent { id: ItemId, content: ItemContent },
    Rebind { id: ItemId, date: NaiveDate },
    ToggleTask { id: ItemId },
    RemoveItem { id: ItemId },
}

/// An item whose content is being edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub item: ItemId,
    /// Content at the time editing started.
    pub original: ItemContent,
}

pub struct Board<P: Persistence> {
    pub store: ItemStore<P>,
    pub timeline: Timeline,
    pub drag: DragController,
    pub connectors: ConnectorRenderer,
    pub viewport: Viewport,
    /// Rendered box sizes reported by the host. Absent means not mounted.
    sizes: HashMap<ItemId, Size>,
    editing: Option<EditSession>,
}

impl<P: Persistence> Board<P> {
    pub fn new(backend: P, config: BoardConfig, today: NaiveDate, viewport: Viewport) -> Self {
        let BoardConfig {
            timeline,
            connector,
            sync,
        } = config;
        let mut timeline = Timeline::centered_on(today, timeline);
        timeline.set_client_width(viewport.width);
        Self {
            store: ItemStore::new(backend, &sync),
            timeline,
            drag: DragController::new(),
            connectors: ConnectorRenderer::new(connector),
            viewport,
            sizes: HashMap::new(),
            editing: None,
        }
    }

    // ─── Items ───────────────────────────────────────────────────────────

    /// Fetch all items of `owner` from the backend.
    pub fn load(&mut self, owner: Option<OwnerKey>) -> Result<usize, StoreError> {
        let count = self.store.load(owner)?;
        self.sizes.retain(|id, _| self.store.get(*id).is_some());
        self.connectors.invalidate(RedrawReason::Structural);
        Ok(count)
    }

    /// Place a new item of `kind` with default content at `position`,
    /// bound to the closest day (today when no marker exists).
    pub fn add_item(&mut self, kind: ItemKind, position: Point) -> Result<Item, StoreError> {
        let date = resolve_binding(position.x, &self.timeline.markers(), self.timeline.today());
        let result = self.store.create(ItemContent::default_for(kind), position, date);
        self.connectors.invalidate(RedrawReason::Structural);
        result
    }

    /// Record the rendered size of an item (mount or re-measure).
    pub fn set_item_size(&mut self, id: ItemId, size: Size) {
        if self.store.get(id).is_none() {
            return;
        }
        if self.sizes.insert(id, size) != Some(size) {
            self.connectors.invalidate(RedrawReason::ItemMounted(id));
        }
    }

    /// The host tore down an item's element.
    pub fn unmount_item(&mut self, id: ItemId) {
        if self.sizes.remove(&id).is_some() {
            self.connectors.invalidate(RedrawReason::Structural);
        }
    }

    /// Rendered box of `item`, following the drag preview.
    pub fn item_bounds(&self, item: &Item) -> Option<Bounds> {
        bounds_for(item, &self.sizes, &self.drag)
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Option<ItemId> {
        hit_test(self.store.items(), |item| self.item_bounds(item), x, y)
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply an interaction result to the store and schedule a redraw.
    /// Returns whether anything changed. Only content updates can fail.
    pub fn apply_mutation(&mut self, mutation: BoardMutation) -> Result<bool, StoreError> {
        Ok(match mutation {
            BoardMutation::MoveItem { id, x, y } => self.move_item(id, x, y),
            BoardMutation::UpdateContent { id, content } => self.update_content(id, content)?,
            BoardMutation::Rebind { id, date } => self.rebind(id, date),
            BoardMutation::ToggleTask { id } => self.toggle_task(id),
            BoardMutation::RemoveItem { id } => self.remove_item(id),
        })
    }

    pub fn move_item(&mut self, id: ItemId, x: f64, y: f64) -> bool {
        let moved = self.store.move_item(id, x, y);
        if moved {
            self.connectors.invalidate(RedrawReason::ItemMoved(id));
        }
        moved
    }

    pub fn update_content(&mut self, id: ItemId, content: ItemContent) -> Result<bool, StoreError> {
        let updated = self.store.update_content(id, content)?;
        if updated {
            self.connectors.invalidate(RedrawReason::ContentChanged(id));
        }
        Ok(updated)
    }

    fn rebind(&mut self, id: ItemId, date: NaiveDate) -> bool {
        let rebound = self.store.rebind(id, date);
        if rebound {
            self.connectors.invalidate(RedrawReason::ItemMoved(id));
        }
        rebound
    }

    pub fn toggle_task(&mut self, id: ItemId) -> bool {
        let toggled = self.store.toggle_task(id);
        if toggled {
            self.connectors.invalidate(RedrawReason::ContentChanged(id));
        }
        toggled
    }

    pub fn remove_item(&mut self, id: ItemId) -> bool {
        if !self.store.remove(id) {
            return false;
        }
        self.sizes.remove(&id);
        self.connectors.forget(id);
        if self.drag.dragged_item() == Some(id) {
            self.drag.cancel();
        }
        if self.editing.as_ref().is_some_and(|e| e.item == id) {
            self.editing = None;
        }
        true
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::PointerDown { x, y } => self.pointer_down(x, y),
            InputEvent::PointerMove { x, y } => self.pointer_move(x, y),
            InputEvent::PointerUp { x, y } => self.pointer_up(x, y).is_some(),
            InputEvent::DoubleClick { x, y } => self.double_click(x, y).is_some(),
            InputEvent::TimelineScroll {
                scroll_left,
                client_width,
            } => {
                self.on_timeline_scroll(scroll_left, client_width);
                true
            }
        }
    }

    /// Start dragging the item under the pointer. Items being edited do
    /// not drag.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        let Some(id) = self.hit_test(x, y) else {
            return false;
        };
        if self.editing.as_ref().is_some_and(|e| e.item == id) {
            return false;
        }
        let Some(position) = self.store.get(id).map(|i| i.position) else {
            return false;
        };
        self.drag.begin(id, Point::new(x, y), position)
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let Some(id) = self.drag.dragged_item() else {
            return false;
        };
        if self.drag.update(Point::new(x, y)).is_some() {
            self.connectors.invalidate(RedrawReason::ItemMoved(id));
            return true;
        }
        false
    }

    /// Finish a drag: one `move` write, then rebind at the final x.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Option<DragCommit> {
        let commit = self.drag.end(Point::new(x, y))?;
        if commit.moved {
            self.move_item(commit.item, commit.position.x, commit.position.y);
        }
        self.rebind_item(commit.item);
        self.connectors.invalidate(RedrawReason::ItemMoved(commit.item));
        Some(commit)
    }

    pub fn double_click(&mut self, x: f64, y: f64) -> Option<&EditSession> {
        let id = self.hit_test(x, y)?;
        self.begin_edit(id)
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Enter edit mode for `id`. Refused while a drag is in progress; any
    /// other edit in progress is cancelled.
    pub fn begin_edit(&mut self, id: ItemId) -> Option<&EditSession> {
        if self.drag.is_dragging() {
            return None;
        }
        let original = self.store.get(id)?.content().clone();
        self.editing = Some(EditSession { item: id, original });
        self.editing.as_ref()
    }

    /// Leave edit mode and write `content` to the edited item.
    pub fn commit_edit(&mut self, content: ItemContent) -> Result<bool, StoreError> {
        let Some(session) = self.editing.take() else {
            return Ok(false);
        };
        self.update_content(session.item, content)
    }

    /// Leave edit mode without writing. Returns the untouched content.
    pub fn cancel_edit(&mut self) -> Option<ItemContent> {
        self.editing.take().map(|s| s.original)
    }

    // ─── Timeline ────────────────────────────────────────────────────────

    /// Handle a timeline scroll report: extend the window if needed, then
    /// rebind every item against the shifted markers.
    pub fn on_timeline_scroll(&mut self, scroll_left: f64, client_width: f64) -> ScrollOutcome {
        let outcome = self.timeline.on_scroll(scroll_left, client_width);
        self.rebind_all();
        self.connectors.invalidate(RedrawReason::TimelineScrolled);
        outcome
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.timeline.set_client_width(viewport.width);
        self.connectors.invalidate(RedrawReason::Resized);
    }

    /// Rebind one item to the day closest to its x. Returns the bound date.
    pub fn rebind_item(&mut self, id: ItemId) -> Option<NaiveDate> {
        let item = self.store.get(id)?;
        let date = resolve_binding(item.position.x, &self.timeline.markers(), item.bound_date);
        self.rebind(id, date);
        Some(date)
    }

    /// Rebind every item. Returns how many bindings changed.
    pub fn rebind_all(&mut self) -> usize {
        let markers = self.timeline.markers();
        let changes: Vec<_> = self
            .store
            .items()
            .iter()
            .filter_map(|item| {
                let date = resolve_binding(item.position.x, &markers, item.bound_date);
                (date != item.bound_date).then_some((item.id(), date))
            })
            .collect();
        let count = changes.len();
        for (id, date) in changes {
            self.rebind(id, date);
        }
        if count > 0 {
            log::debug!("rebound {count} item(s)");
        }
        count
    }

    // ─── Rendering & sync ────────────────────────────────────────────────

    /// Fallback redraw timer. Returns whether connectors need a redraw.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.connectors.tick(now_ms)
    }

    /// Current connectors, recomputed if anything invalidated them.
    pub fn connectors(&mut self) -> &[Connector] {
        if !self.connectors.needs_redraw() {
            return self.connectors.connectors();
        }
        let sizes = &self.sizes;
        let drag = &self.drag;
        self.connectors.recompute(
            self.store.items(),
            |item| bounds_for(item, sizes, drag),
            &self.timeline,
        )
    }

    /// Push queued writes to the backend.
    pub fn flush(&mut self) -> FlushReport {
        self.store.flush()
    }
}

fn bounds_for(item: &Item, sizes: &HashMap<ItemId, Size>, drag: &DragController) -> Option<Bounds> {
    let size = sizes.get(&item.id())?;
    let origin = drag.visual_position(item.id()).unwrap_or(item.position);
    Some(Bounds::from_origin_size(origin, *size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryPersistence;
    use tb_core::{TaskContent, TextContent};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn board() -> Board<MemoryPersistence> {
        Board::new(
            MemoryPersistence::new(),
            BoardConfig::default(),
            today(),
            Viewport::default(),
        )
    }

    fn mounted(board: &mut Board<MemoryPersistence>, kind: ItemKind, at: Point) -> ItemId {
        let id = board.add_item(kind, at).unwrap().id();
        board.set_item_size(id, Size::new(180.0, 60.0));
        id
    }

    #[test]
    fn add_item_binds_to_closest_marker() {
        let mut b = board();
        // column 3 spans 420..560; its center is 490
        let item = b.add_item(ItemKind::Text, Point::new(480.0, 300.0)).unwrap();
        assert_eq!(item.bound_date, b.timeline.first() + chrono::Days::new(3));
        assert_eq!(item.content(), &ItemContent::default_for(ItemKind::Text));
    }

    #[test]
    fn drag_commits_once_and_rebinds() {
        let mut b = board();
        let id = mounted(&mut b, ItemKind::Task, Point::new(50.0, 300.0));
        b.flush();

        assert!(b.pointer_down(60.0, 310.0));
        assert!(b.pointer_move(200.0, 310.0));
        assert!(b.pointer_move(340.0, 310.0));
        assert_eq!(b.store.get(id).unwrap().position, Point::new(50.0, 300.0));

        let commit = b.pointer_up(340.0, 310.0).unwrap();
        assert_eq!(commit.position, Point::new(330.0, 300.0));
        let item = b.store.get(id).unwrap();
        assert_eq!(item.position, Point::new(330.0, 300.0));
        // column 2 center 350 is the closest to x = 330
        assert_eq!(item.bound_date, b.timeline.first() + chrono::Days::new(2));
        // move + rebind coalesce into one write
        assert_eq!(b.store.pending_writes(), 1);
    }

    #[test]
    fn connectors_follow_drag_preview() {
        let mut b = board();
        let id = mounted(&mut b, ItemKind::Event, Point::new(50.0, 300.0));
        let before = b.connectors()[0].anchor;
        b.pointer_down(60.0, 310.0);
        b.pointer_move(160.0, 310.0);
        let during = b.connectors()[0].anchor;
        assert_eq!(during.x, before.x + 100.0);
        assert_eq!(b.connectors.connector_for(id).unwrap().item, id);
    }

    #[test]
    fn background_press_does_not_drag() {
        let mut b = board();
        mounted(&mut b, ItemKind::Text, Point::new(50.0, 300.0));
        assert!(!b.pointer_down(700.0, 20.0));
        assert!(b.pointer_up(700.0, 20.0).is_none());
    }

    #[test]
    fn items_being_edited_do_not_drag() {
        let mut b = board();
        let id = mounted(&mut b, ItemKind::Text, Point::new(50.0, 300.0));
        assert_eq!(b.double_click(60.0, 310.0).map(|e| e.item), Some(id));
        assert!(!b.pointer_down(60.0, 310.0));

        let edited = ItemContent::Text(TextContent {
            text: "Plan".into(),
            subtext: "Q3".into(),
        });
        assert!(b.commit_edit(edited.clone()).unwrap());
        assert_eq!(b.store.get(id).unwrap().content(), &edited);
        assert!(b.editing().is_none());
        assert!(b.pointer_down(60.0, 310.0));
    }

    #[test]
    fn no_edit_mode_while_dragging() {
        let mut b = board();
        let dragged = mounted(&mut b, ItemKind::Text, Point::new(50.0, 300.0));
        let other = mounted(&mut b, ItemKind::Task, Point::new(400.0, 300.0));
        assert!(b.pointer_down(60.0, 310.0));

        assert!(b.double_click(410.0, 310.0).is_none());
        assert!(b.double_click(60.0, 310.0).is_none());
        assert!(b.begin_edit(other).is_none());
        assert!(b.editing().is_none());
        assert_eq!(b.drag.dragged_item(), Some(dragged));

        b.pointer_up(60.0, 310.0);
        assert_eq!(b.double_click(410.0, 310.0).map(|e| e.item), Some(other));
    }

    #[test]
    fn repeated_scrolls_keep_one_write_per_item() {
        let mut b = board();
        for x in [50.0, 330.0, 610.0] {
            mounted(&mut b, ItemKind::Text, Point::new(x, 300.0));
        }
        b.flush();
        for scroll_left in [1400.0, 1540.0, 1680.0, 1820.0] {
            b.on_timeline_scroll(scroll_left, 800.0);
        }
        let pending = b.store.pending_writes();
        assert!((1..=3).contains(&pending), "{pending} pending writes");
    }

    #[test]
    fn cancel_edit_leaves_content_alone() {
        let mut b = board();
        let id = mounted(&mut b, ItemKind::Task, Point::new(50.0, 300.0));
        b.begin_edit(id);
        assert_eq!(b.cancel_edit(), Some(ItemContent::default_for(ItemKind::Task)));
        assert!(!b.commit_edit(ItemContent::default_for(ItemKind::Task)).unwrap());
    }

    #[test]
    fn scroll_rebinds_all_items() {
        let mut b = board();
        let id = mounted(&mut b, ItemKind::Text, Point::new(330.0, 300.0));
        let before = b.store.get(id).unwrap().bound_date;
        let outcome = b.on_timeline_scroll(1400.0, 800.0);
        assert!(outcome.extension.is_none());
        let after = b.store.get(id).unwrap().bound_date;
        assert_eq!(after, before + chrono::Days::new(10));
    }

    #[test]
    fn toggle_and_remove() {
        let mut b = board();
        let id = mounted(&mut b, ItemKind::Task, Point::new(50.0, 300.0));
        assert!(b.toggle_task(id));
        assert!(matches!(
            b.store.get(id).unwrap().content(),
            ItemContent::Task(TaskContent { completed: true, .. })
        ));
        assert!(b.remove_item(id));
        assert!(b.connectors().is_empty());
        assert!(b.hit_test(60.0, 310.0).is_none());
    }

    #[test]
    fn mutations_route_through_the_store() {
        let mut b = board();
        let id = mounted(&mut b, ItemKind::Task, Point::new(50.0, 300.0));
        b.flush();
        b.connectors();
        assert!(!b.connectors.needs_redraw());
        assert!(b.apply_mutation(BoardMutation::MoveItem { id, x: 70.0, y: 320.0 }).unwrap());
        assert!(b.apply_mutation(BoardMutation::ToggleTask { id }).unwrap());
        let wrong_kind = BoardMutation::UpdateContent {
            id,
            content: ItemContent::default_for(ItemKind::Event),
        };
        assert!(b.apply_mutation(wrong_kind).is_err());
        assert_eq!(b.store.pending_writes(), 1);
        assert!(b.connectors.needs_redraw());
    }

    #[test]
    fn unmounted_items_have_no_connector() {
        let mut b = board();
        b.add_item(ItemKind::Image, Point::new(50.0, 300.0)).unwrap();
        assert!(b.connectors().is_empty());
    }
}
