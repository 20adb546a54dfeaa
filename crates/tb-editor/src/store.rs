//! Item store with write-through persistence.
//!
//! The store owns the authoritative item list. Every mutation is applied to
//! the local list first and only then queued for the backend, so the UI
//! never waits on storage:
//!
//! - **create** writes through immediately; on failure the optimistic item
//!   stays on the board, a `Create` is queued and the error is surfaced to
//!   the caller.
//! - **move / update / rebind / toggle / remove** are queued in an outbox
//!   and drained by [`ItemStore::flush`].
//!
//! The outbox holds at most one write per item. Later patches merge into
//! the queued write, so a retried write always carries the newest state.
//! Failed writes are retried on later flushes up to `max_attempts`, then
//! dropped. Local state is never rolled back.

use crate::persist::{OwnerKey, Persistence, PersistenceError};
use std::collections::VecDeque;
use tb_core::{Item, ItemContent, ItemId, ItemPatch, ModelError, NaiveDate, Point, SyncConfig};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("item {0} is not on the board")]
    UnknownItem(ItemId),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] PersistenceError),
    /// The item exists on the board but the backend did not take it.
    #[error("item {id} kept locally, write-through failed: {source}")]
    NotPersisted { id: ItemId, source: PersistenceError },
}

/// A write waiting in the outbox.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// The backend has not taken the item yet.
    Create { item: Item },
    Update { id: ItemId, patch: ItemPatch },
    Delete { id: ItemId },
}

impl PendingWrite {
    pub fn op(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    pub fn id(&self) -> ItemId {
        match self {
            Self::Create { item } => item.id(),
            Self::Update { id, .. } | Self::Delete { id } => *id,
        }
    }
}

/// Result of sending one write.
enum Sent {
    Written,
    /// The backend does not know an item that still exists locally.
    Missing,
}

#[derive(Debug)]
struct Pending {
    write: PendingWrite,
    attempts: u32,
}

/// Outcome of one [`ItemStore::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: usize,
    /// Failed this round, still queued.
    pub retrying: usize,
    /// Failed for the last allowed time and discarded.
    pub dropped: usize,
}

pub struct ItemStore<P: Persistence> {
    items: Vec<Item>,
    backend: P,
    outbox: VecDeque<Pending>,
    max_attempts: u32,
}

impl<P: Persistence> ItemStore<P> {
    pub fn new(backend: P, sync: &SyncConfig) -> Self {
        Self {
            items: Vec::new(),
            backend,
            outbox: VecDeque::new(),
            max_attempts: sync.max_attempts.max(1),
        }
    }

    pub fn backend(&self) -> &P {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut P {
        &mut self.backend
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pending_writes(&self) -> usize {
        self.outbox.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingWrite> {
        self.outbox.iter().map(|p| &p.write)
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id() == id)
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Replace the local list with the backend's items for `owner`.
    /// On failure the current list is left untouched.
    pub fn load(&mut self, owner: Option<OwnerKey>) -> Result<usize, StoreError> {
        let items = self.backend.fetch_all(owner).map_err(|e| {
            log::warn!("loading items failed: {e}");
            e
        })?;
        log::info!("loaded {} item(s)", items.len());
        self.items = items;
        self.outbox.clear();
        Ok(self.items.len())
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Create an item with a fresh client-side id.
    ///
    /// The item is inserted locally before the backend is called. If the
    /// backend fails the item stays, a retry is queued and `NotPersisted`
    /// carries its id.
    pub fn create(
        &mut self,
        content: ItemContent,
        position: Point,
        bound_date: NaiveDate,
    ) -> Result<Item, StoreError> {
        let item = Item::new(ItemId::generate(), content, position, bound_date);
        let id = item.id();
        self.items.push(item.clone());
        log::debug!("created {} item {id} at ({}, {})", item.kind(), position.x, position.y);

        match self.backend.create(&item) {
            Ok(saved) => {
                self.acknowledge(&saved);
                self.get(id).cloned().ok_or(StoreError::UnknownItem(id))
            }
            Err(e) => {
                log::warn!("persisting new item {id} failed, keeping local copy: {e}");
                self.outbox.push_back(Pending {
                    write: PendingWrite::Create { item },
                    attempts: 0,
                });
                Err(StoreError::NotPersisted { id, source: e })
            }
        }
    }

    /// Merge backend metadata into the local copy of `saved`.
    pub fn acknowledge(&mut self, saved: &Item) -> bool {
        match self.get_mut(saved.id()) {
            Some(local) => {
                local.meta = saved.meta;
                true
            }
            None => false,
        }
    }

    /// Set an item's position. Unknown ids are a silent no-op.
    pub fn move_item(&mut self, id: ItemId, x: f64, y: f64) -> bool {
        let Some(item) = self.get_mut(id) else {
            log::debug!("move ignored: no item {id}");
            return false;
        };
        let position = Point::new(x, y);
        if item.position == position {
            return true;
        }
        item.position = position;
        self.enqueue_patch(
            id,
            ItemPatch {
                position: Some(position),
                ..ItemPatch::default()
            },
        );
        true
    }

    /// Replace an item's payload. `Ok(false)` for unknown ids; a payload of
    /// another kind is rejected and leaves the item untouched.
    pub fn update_content(&mut self, id: ItemId, content: ItemContent) -> Result<bool, StoreError> {
        let Some(item) = self.get_mut(id) else {
            log::debug!("content update ignored: no item {id}");
            return Ok(false);
        };
        if *item.content() == content {
            return Ok(true);
        }
        item.replace_content(content.clone())?;
        self.enqueue_patch(
            id,
            ItemPatch {
                content: Some(content),
                ..ItemPatch::default()
            },
        );
        Ok(true)
    }

    /// Record a new bound date. Queues a write only when the date changed.
    pub fn rebind(&mut self, id: ItemId, date: NaiveDate) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        if item.bound_date == date {
            return false;
        }
        log::debug!("item {id} rebound {} -> {date}", item.bound_date);
        item.bound_date = date;
        self.enqueue_patch(
            id,
            ItemPatch {
                bound_date: Some(date),
                ..ItemPatch::default()
            },
        );
        true
    }

    /// Flip a task's completion flag.
    pub fn toggle_task(&mut self, id: ItemId) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        if !item.toggle_task() {
            return false;
        }
        let content = item.content().clone();
        self.enqueue_patch(
            id,
            ItemPatch {
                content: Some(content),
                ..ItemPatch::default()
            },
        );
        true
    }

    /// Remove an item. Queued writes for it are discarded; an item the
    /// backend never took needs no delete.
    pub fn remove(&mut self, id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id() != id);
        if self.items.len() == before {
            return false;
        }
        let unsaved = self
            .outbox
            .iter()
            .any(|p| matches!(&p.write, PendingWrite::Create { item } if item.id() == id));
        self.outbox.retain(|p| p.write.id() != id);
        if !unsaved {
            self.outbox.push_back(Pending {
                write: PendingWrite::Delete { id },
                attempts: 0,
            });
        }
        true
    }

    /// Merge `patch` into the item's queued write, or queue a new one.
    /// A merged write starts its attempt count over.
    fn enqueue_patch(&mut self, id: ItemId, patch: ItemPatch) {
        let current = self.get(id).cloned();
        let Some(pending) = self.outbox.iter_mut().find(|p| p.write.id() == id) else {
            self.outbox.push_back(Pending {
                write: PendingWrite::Update { id, patch },
                attempts: 0,
            });
            return;
        };
        match &mut pending.write {
            PendingWrite::Update { patch: queued, .. } => queued.merge(patch),
            PendingWrite::Create { item } => {
                if let Some(current) = current {
                    *item = current;
                }
            }
            PendingWrite::Delete { .. } => return,
        }
        pending.attempts = 0;
    }

    // ─── Sync ────────────────────────────────────────────────────────────

    /// Drain the outbox through the backend.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        let mut retry = VecDeque::new();

        while let Some(mut pending) = self.outbox.pop_front() {
            let id = pending.write.id();
            match self.send(&pending.write) {
                Ok(Sent::Written) => report.written += 1,
                Ok(Sent::Missing) => {
                    log::warn!("backend has no item {id}, queueing a create");
                    if let Some(item) = self.get(id).cloned() {
                        retry.push_back(Pending {
                            write: PendingWrite::Create { item },
                            attempts: 0,
                        });
                    }
                    report.retrying += 1;
                }
                Err(e) => {
                    pending.attempts += 1;
                    if pending.attempts >= self.max_attempts {
                        log::warn!(
                            "dropping {} for {id} after {} attempt(s): {e}",
                            pending.write.op(),
                            pending.attempts
                        );
                        report.dropped += 1;
                    } else {
                        log::warn!("{} for {id} failed, will retry: {e}", pending.write.op());
                        report.retrying += 1;
                        retry.push_back(pending);
                    }
                }
            }
        }

        self.outbox = retry;
        report
    }

    fn send(&mut self, write: &PendingWrite) -> Result<Sent, PersistenceError> {
        match write {
            PendingWrite::Create { item } => {
                let saved = self.backend.create(item)?;
                self.acknowledge(&saved);
                Ok(Sent::Written)
            }
            PendingWrite::Update { id, patch } => match self.backend.update(*id, patch)? {
                Some(_) => Ok(Sent::Written),
                None if self.get(*id).is_some() => Ok(Sent::Missing),
                None => Ok(Sent::Written),
            },
            PendingWrite::Delete { id } => {
                if !self.backend.delete(*id)? {
                    log::debug!("backend had no item {id} to delete");
                }
                Ok(Sent::Written)
            }
        }
    }
}
