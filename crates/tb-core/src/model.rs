//! Board item data model.
//!
//! An [`Item`] is one note, task, event or image placed on the board. Its
//! payload is a sum type keyed by [`ItemKind`]: the kind is derived from the
//! content variant, so an item can never carry fields of another kind.
//! `bound_date` is a cached binding recomputed from horizontal proximity to
//! the timeline markers (see [`crate::binding`]).
//!
//! The serde form is the persistence wire shape:
//! `{ id, type, content, position: {x, y}, connectedDate }`.

use crate::geometry::Point;
use crate::id::ItemId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("malformed item json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("content does not match item type `{kind}`: {source}")]
    Content {
        kind: ItemKind,
        source: serde_json::Error,
    },
    #[error("invalid connectedDate `{0}`")]
    Date(String),
    #[error("unknown item type `{0}`")]
    UnknownKind(String),
    #[error("cannot replace `{expected}` content with `{found}` content")]
    KindMismatch { expected: ItemKind, found: ItemKind },
}

// ─── Kind ────────────────────────────────────────────────────────────────

/// The closed set of item kinds. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Text,
    Task,
    Event,
    Image,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [Self::Text, Self::Task, Self::Event, Self::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Task => "task",
            Self::Event => "event",
            Self::Image => "image",
        }
    }

    /// Accent colour used for the item's connector.
    pub fn accent_rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Text => (0xA0, 0x2C, 0x2C),
            Self::Task => (0xDC, 0x62, 0x38),
            Self::Event => (0x2A, 0x4B, 0x7C),
            Self::Image => (0x5D, 0x3A, 0x1A),
        }
    }

    pub fn accent_hex(self) -> String {
        let (r, g, b) = self.accent_rgb();
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

// ─── Content ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    #[serde(default)]
    pub subtext: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskContent {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventContent {
    pub title: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageContent {
    #[serde(default)]
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Kind-specific payload of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemContent {
    Text(TextContent),
    Task(TaskContent),
    Event(EventContent),
    Image(ImageContent),
}

impl ItemContent {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Text(_) => ItemKind::Text,
            Self::Task(_) => ItemKind::Task,
            Self::Event(_) => ItemKind::Event,
            Self::Image(_) => ItemKind::Image,
        }
    }

    /// Placeholder content for a freshly added item.
    pub fn default_for(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Text => Self::Text(TextContent {
                text: "New text note".into(),
                subtext: String::new(),
            }),
            ItemKind::Task => Self::Task(TaskContent {
                text: "New task".into(),
                completed: false,
            }),
            ItemKind::Event => Self::Event(EventContent {
                title: "New event".into(),
                ..EventContent::default()
            }),
            ItemKind::Image => Self::Image(ImageContent::default()),
        }
    }

    /// Decode the untagged `content` object of the wire shape for `kind`.
    pub fn from_value(kind: ItemKind, value: serde_json::Value) -> Result<Self, ModelError> {
        let wrap = |source| ModelError::Content { kind, source };
        Ok(match kind {
            ItemKind::Text => Self::Text(serde_json::from_value(value).map_err(wrap)?),
            ItemKind::Task => Self::Task(serde_json::from_value(value).map_err(wrap)?),
            ItemKind::Event => Self::Event(serde_json::from_value(value).map_err(wrap)?),
            ItemKind::Image => Self::Image(serde_json::from_value(value).map_err(wrap)?),
        })
    }

    pub fn to_value(&self) -> serde_json::Value {
        let value = match self {
            Self::Text(c) => serde_json::to_value(c),
            Self::Task(c) => serde_json::to_value(c),
            Self::Event(c) => serde_json::to_value(c),
            Self::Image(c) => serde_json::to_value(c),
        };
        // Plain string/bool structs always serialize.
        value.unwrap_or(serde_json::Value::Null)
    }
}

// ─── Item ────────────────────────────────────────────────────────────────

/// Backend-assigned bookkeeping, merged back after a create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemMeta {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One placed board item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ItemWire", into = "ItemWire")]
pub struct Item {
    id: ItemId,
    content: ItemContent,
    /// Free-floating top-left position on the board.
    pub position: Point,
    /// Date of the horizontally closest marker at the last (re)binding.
    pub bound_date: NaiveDate,
    pub meta: ItemMeta,
}

impl Item {
    pub fn new(id: ItemId, content: ItemContent, position: Point, bound_date: NaiveDate) -> Self {
        Self {
            id,
            content,
            position,
            bound_date,
            meta: ItemMeta::default(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        self.content.kind()
    }

    pub fn content(&self) -> &ItemContent {
        &self.content
    }

    /// Replace the payload; the variant must match the item's kind.
    pub fn replace_content(&mut self, content: ItemContent) -> Result<(), ModelError> {
        if content.kind() != self.kind() {
            return Err(ModelError::KindMismatch {
                expected: self.kind(),
                found: content.kind(),
            });
        }
        self.content = content;
        Ok(())
    }

    /// Flip a task's completion flag. Returns `false` for other kinds.
    pub fn toggle_task(&mut self) -> bool {
        match &mut self.content {
            ItemContent::Task(task) => {
                task.completed = !task.completed;
                true
            }
            _ => false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A partial update, as sent to the backend's `update(id, fields)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub content: Option<ItemContent>,
    pub position: Option<Point>,
    pub bound_date: Option<NaiveDate>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.position.is_none() && self.bound_date.is_none()
    }

    /// Fold a later patch into this one; later fields win.
    pub fn merge(&mut self, later: ItemPatch) {
        if later.content.is_some() {
            self.content = later.content;
        }
        if later.position.is_some() {
            self.position = later.position;
        }
        if later.bound_date.is_some() {
            self.bound_date = later.bound_date;
        }
    }

    /// Apply to an item. Content of the wrong kind is rejected.
    pub fn apply_to(&self, item: &mut Item) -> Result<(), ModelError> {
        if let Some(content) = &self.content {
            item.replace_content(content.clone())?;
        }
        if let Some(position) = self.position {
            item.position = position;
        }
        if let Some(date) = self.bound_date {
            item.bound_date = date;
        }
        Ok(())
    }

    /// Partial wire form: only the present fields, camelCase.
    pub fn to_value(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(content) = &self.content {
            obj.insert("content".into(), content.to_value());
        }
        if let Some(p) = self.position {
            obj.insert("position".into(), serde_json::json!({ "x": p.x, "y": p.y }));
        }
        if let Some(date) = self.bound_date {
            obj.insert("connectedDate".into(), date.format(ISO_DATE).to_string().into());
        }
        serde_json::Value::Object(obj)
    }
}

// ─── Wire shape ──────────────────────────────────────────────────────────

const ISO_DATE: &str = "%Y-%m-%d";

/// Parse `connectedDate`: a bare `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(s, ISO_DATE)
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .map_err(|_| ModelError::Date(s.to_string()))
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemWire {
    id: ItemId,
    #[serde(rename = "type")]
    kind: ItemKind,
    content: serde_json::Value,
    position: Point,
    connected_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ItemWire> for Item {
    type Error = ModelError;

    fn try_from(wire: ItemWire) -> Result<Self, Self::Error> {
        Ok(Item {
            id: wire.id,
            content: ItemContent::from_value(wire.kind, wire.content)?,
            position: wire.position,
            bound_date: parse_iso_date(&wire.connected_date)?,
            meta: ItemMeta {
                created_at: wire.created_at,
                updated_at: wire.updated_at,
            },
        })
    }
}

impl From<Item> for ItemWire {
    fn from(item: Item) -> Self {
        ItemWire {
            id: item.id,
            kind: item.kind(),
            content: item.content.to_value(),
            position: item.position,
            connected_date: item.bound_date.format(ISO_DATE).to_string(),
            created_at: item.meta.created_at,
            updated_at: item.meta.updated_at,
        }
    }
}
