//! Persistence over the JS host page.
//!
//! The board runs synchronously inside wasm while network I/O belongs to
//! the page. Every write becomes a [`HostRequest`] that the page drains
//! with `take_writes()`, performs with `fetch`, and acknowledges. The
//! bridge mirrors the last known server state so `update` can answer with
//! the resulting item.

use serde_json::{Value, json};
use tb_core::{Item, ItemId, ItemPatch};
use tb_editor::persist::{OwnerKey, Persistence, PersistenceError};

pub const ITEMS_PATH: &str = "/api/whiteboard-items";

/// One HTTP call for the host to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    Create { item: Item },
    Update { id: ItemId, fields: Value },
    Delete { id: ItemId },
}

impl HostRequest {
    pub fn op(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::Create { .. } => "POST",
            Self::Update { .. } => "PUT",
            Self::Delete { .. } => "DELETE",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Create { .. } => ITEMS_PATH.to_string(),
            Self::Update { id, .. } | Self::Delete { id } => format!("{ITEMS_PATH}/{id}"),
        }
    }

    /// `{"op", "method", "path", "body"}`; `body` is null for deletes.
    pub fn to_value(&self) -> Value {
        let body = match self {
            Self::Create { item } => serde_json::to_value(item).unwrap_or_default(),
            Self::Update { fields, .. } => fields.clone(),
            Self::Delete { .. } => Value::Null,
        };
        json!({
            "op": self.op(),
            "method": self.method(),
            "path": self.path(),
            "body": body,
        })
    }
}

pub struct HostBridge {
    mirror: Vec<Item>,
    requests: Vec<HostRequest>,
    online: bool,
}

impl Default for HostBridge {
    fn default() -> Self {
        Self {
            mirror: Vec::new(),
            requests: Vec::new(),
            online: true,
        }
    }
}

impl HostBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mirror with items the host fetched.
    pub fn seed(&mut self, items: Vec<Item>) {
        self.mirror = items;
    }

    pub fn set_online(&mut self, online: bool) {
        if self.online != online {
            log::info!("host persistence {}", if online { "online" } else { "offline" });
        }
        self.online = online;
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Hand all recorded requests to the host.
    pub fn take_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Merge metadata from the host's create response into the mirror.
    pub fn acknowledge(&mut self, saved: &Item) -> bool {
        match self.mirror.iter_mut().find(|i| i.id() == saved.id()) {
            Some(local) => {
                local.meta = saved.meta;
                true
            }
            None => false,
        }
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.online {
            Ok(())
        } else {
            Err(PersistenceError::Unavailable("host reported offline".into()))
        }
    }
}

impl Persistence for HostBridge {
    fn fetch_all(&mut self, owner: Option<OwnerKey>) -> Result<Vec<Item>, PersistenceError> {
        self.check()?;
        // The host's session already scopes the fetch to its user.
        log::trace!("fetch_all (owner {owner:?}) from host mirror");
        Ok(self.mirror.clone())
    }

    fn create(&mut self, item: &Item) -> Result<Item, PersistenceError> {
        self.check()?;
        self.mirror.push(item.clone());
        self.requests.push(HostRequest::Create { item: item.clone() });
        Ok(item.clone())
    }

    fn update(&mut self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, PersistenceError> {
        self.check()?;
        let Some(item) = self.mirror.iter_mut().find(|i| i.id() == id) else {
            return Ok(None);
        };
        patch
            .apply_to(item)
            .map_err(|e| PersistenceError::Rejected(e.to_string()))?;
        let updated = item.clone();
        self.requests.push(HostRequest::Update {
            id,
            fields: patch.to_value(),
        });
        Ok(Some(updated))
    }

    fn delete(&mut self, id: ItemId) -> Result<bool, PersistenceError> {
        self.check()?;
        let before = self.mirror.len();
        self.mirror.retain(|i| i.id() != id);
        if self.mirror.len() == before {
            return Ok(false);
        }
        self.requests.push(HostRequest::Delete { id });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tb_core::{ItemContent, ItemKind, NaiveDate, Point};

    fn item(name: &str) -> Item {
        Item::new(
            ItemId::intern(name),
            ItemContent::default_for(ItemKind::Event),
            Point::new(10.0, 20.0),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        )
    }

    #[test]
    fn writes_become_host_requests() {
        let mut bridge = HostBridge::new();
        bridge.create(&item("hb-1")).unwrap();
        let patch = ItemPatch {
            position: Some(Point::new(1.0, 2.0)),
            ..ItemPatch::default()
        };
        assert!(bridge.update(ItemId::intern("hb-1"), &patch).unwrap().is_some());
        assert!(bridge.delete(ItemId::intern("hb-1")).unwrap());

        let requests = bridge.take_requests();
        let ops: Vec<_> = requests.iter().map(|r| (r.method(), r.path())).collect();
        assert_eq!(
            ops,
            vec![
                ("POST", "/api/whiteboard-items".to_string()),
                ("PUT", "/api/whiteboard-items/hb-1".to_string()),
                ("DELETE", "/api/whiteboard-items/hb-1".to_string()),
            ]
        );
        assert_eq!(
            requests[1].to_value()["body"],
            json!({ "position": { "x": 1.0, "y": 2.0 } })
        );
        assert!(bridge.take_requests().is_empty());
    }

    #[test]
    fn create_body_uses_wire_shape() {
        let mut bridge = HostBridge::new();
        bridge.create(&item("hb-2")).unwrap();
        let value = bridge.take_requests()[0].to_value();
        assert_eq!(value["op"], "create");
        assert_eq!(value["body"]["type"], "event");
        assert_eq!(value["body"]["connectedDate"], "2024-02-29");
    }

    #[test]
    fn unknown_ids_produce_no_requests() {
        let mut bridge = HostBridge::new();
        assert_eq!(bridge.delete(ItemId::intern("hb-none")), Ok(false));
        assert!(bridge.take_requests().is_empty());
    }

    #[test]
    fn offline_bridge_refuses_writes() {
        let mut bridge = HostBridge::new();
        bridge.set_online(false);
        assert!(matches!(
            bridge.create(&item("hb-3")),
            Err(PersistenceError::Unavailable(_))
        ));
        bridge.set_online(true);
        bridge.seed(vec![item("hb-4")]);
        assert_eq!(bridge.fetch_all(None).unwrap().len(), 1);
    }
}
