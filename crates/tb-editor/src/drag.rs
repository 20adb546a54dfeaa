//! Drag state machine.
//!
//! `Idle → Dragging → Idle`. While dragging, only the visual position
//! changes; the store sees a single commit when the pointer is released.
//! The final position is computed from the release point alone, so a lost
//! or coalesced move event never skews the commit.

use tb_core::{ItemId, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub item: ItemId,
    pub start_pointer: Point,
    pub start_position: Point,
    /// Preview position shown while dragging.
    pub visual: Point,
}

impl DragSession {
    fn position_for(&self, pointer: Point) -> Point {
        self.start_position.offset(
            pointer.x - self.start_pointer.x,
            pointer.y - self.start_pointer.y,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// What a finished drag hands to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCommit {
    pub item: ItemId,
    pub position: Point,
    /// The release point differs from the press point.
    pub moved: bool,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn dragged_item(&self) -> Option<ItemId> {
        match &self.state {
            DragState::Dragging(s) => Some(s.item),
            DragState::Idle => None,
        }
    }

    /// Start dragging `item`, currently at `position`. Refused while
    /// another drag is active.
    pub fn begin(&mut self, item: ItemId, pointer: Point, position: Point) -> bool {
        if self.is_dragging() {
            log::debug!("drag of {item} refused: already dragging");
            return false;
        }
        log::trace!("drag start {item} at ({}, {})", pointer.x, pointer.y);
        self.state = DragState::Dragging(DragSession {
            item,
            start_pointer: pointer,
            start_position: position,
            visual: position,
        });
        true
    }

    /// Track the pointer. Returns the new preview position while dragging.
    pub fn update(&mut self, pointer: Point) -> Option<Point> {
        match &mut self.state {
            DragState::Dragging(session) => {
                session.visual = session.position_for(pointer);
                Some(session.visual)
            }
            DragState::Idle => None,
        }
    }

    /// Release at `pointer`. A second release without a new `begin` is a
    /// no-op.
    pub fn end(&mut self, pointer: Point) -> Option<DragCommit> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return None;
        };
        let position = session.position_for(pointer);
        log::trace!("drag end {} at ({}, {})", session.item, position.x, position.y);
        Some(DragCommit {
            item: session.item,
            position,
            moved: position != session.start_position,
        })
    }

    /// Abandon the drag without committing.
    pub fn cancel(&mut self) -> Option<ItemId> {
        let item = self.dragged_item();
        self.state = DragState::Idle;
        item
    }

    /// Preview position of `id` if it is the item being dragged.
    pub fn visual_position(&self, id: ItemId) -> Option<Point> {
        match &self.state {
            DragState::Dragging(s) if s.item == id => Some(s.visual),
            _ => None,
        }
    }
}
