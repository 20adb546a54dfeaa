//! Persistence collaborator contract.
//!
//! A CRUD store addressed by the client-chosen [`ItemId`]. The backend may
//! attach metadata on create but must keep the client identifier. One
//! handle is built at startup and injected into the [`crate::store::ItemStore`].

use chrono::Utc;
use tb_core::{Item, ItemId, ItemPatch};

/// Owning-user key used to scope `fetch_all`.
pub type OwnerKey = u32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
    #[error("persistence rejected the write: {0}")]
    Rejected(String),
}

pub trait Persistence {
    /// All items of `owner` (`None`: items without an owner).
    fn fetch_all(&mut self, owner: Option<OwnerKey>) -> Result<Vec<Item>, PersistenceError>;

    /// Store a new item; returns it with backend metadata merged in.
    fn create(&mut self, item: &Item) -> Result<Item, PersistenceError>;

    /// Apply a partial update. `Ok(None)` when the id is unknown.
    fn update(&mut self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, PersistenceError>;

    /// Delete by id. `Ok(false)` when the id is unknown.
    fn delete(&mut self, id: ItemId) -> Result<bool, PersistenceError>;
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn fetch_all(&mut self, owner: Option<OwnerKey>) -> Result<Vec<Item>, PersistenceError> {
        (**self).fetch_all(owner)
    }

    fn create(&mut self, item: &Item) -> Result<Item, PersistenceError> {
        (**self).create(item)
    }

    fn update(&mut self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, PersistenceError> {
        (**self).update(id, patch)
    }

    fn delete(&mut self, id: ItemId) -> Result<bool, PersistenceError> {
        (**self).delete(id)
    }
}

// ─── In-memory backend ───────────────────────────────────────────────────

struct Row {
    item: Item,
    owner: Option<OwnerKey>,
}

/// Process-local backend. Doubles as a test fake: it can be taken offline
/// or told to fail the next N calls.
#[derive(Default)]
pub struct MemoryPersistence {
    rows: Vec<Row>,
    owner: Option<OwnerKey>,
    offline: bool,
    fail_next: u32,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner stamped on rows created from now on.
    pub fn with_owner(owner: OwnerKey) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Fail the next `n` calls, then recover.
    pub fn fail_next(&mut self, n: u32) {
        self.fail_next = n;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.rows.iter().find(|r| r.item.id() == id).map(|r| &r.item)
    }

    /// Seed a row directly, bypassing availability checks.
    pub fn insert(&mut self, item: Item, owner: Option<OwnerKey>) {
        self.rows.push(Row { item, owner });
    }

    fn check(&mut self) -> Result<(), PersistenceError> {
        if self.offline {
            return Err(PersistenceError::Unavailable("backend offline".into()));
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(PersistenceError::Unavailable("transient failure".into()));
        }
        Ok(())
    }
}

impl Persistence for MemoryPersistence {
    fn fetch_all(&mut self, owner: Option<OwnerKey>) -> Result<Vec<Item>, PersistenceError> {
        self.check()?;
        Ok(self
            .rows
            .iter()
            .filter(|r| r.owner == owner)
            .map(|r| r.item.clone())
            .collect())
    }

    fn create(&mut self, item: &Item) -> Result<Item, PersistenceError> {
        self.check()?;
        if self.get(item.id()).is_some() {
            return Err(PersistenceError::Rejected(format!("duplicate id {}", item.id())));
        }
        let now = Utc::now();
        let mut stored = item.clone();
        stored.meta.created_at = Some(now);
        stored.meta.updated_at = Some(now);
        self.rows.push(Row {
            item: stored.clone(),
            owner: self.owner,
        });
        Ok(stored)
    }

    fn update(&mut self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, PersistenceError> {
        self.check()?;
        let Some(row) = self.rows.iter_mut().find(|r| r.item.id() == id) else {
            return Ok(None);
        };
        patch
            .apply_to(&mut row.item)
            .map_err(|e| PersistenceError::Rejected(e.to_string()))?;
        row.item.meta.updated_at = Some(Utc::now());
        Ok(Some(row.item.clone()))
    }

    fn delete(&mut self, id: ItemId) -> Result<bool, PersistenceError> {
        self.check()?;
        let before = self.rows.len();
        self.rows.retain(|r| r.item.id() != id);
        Ok(self.rows.len() != before)
    }
}
