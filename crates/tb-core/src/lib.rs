pub mod binding;
pub mod config;
pub mod geometry;
pub mod id;
pub mod model;
pub mod timeline;

pub use binding::{BindingError, DateMarker, find_closest_date, resolve_binding};
pub use config::{
    AnchorMode, BoardConfig, ConfigError, ConnectorConfig, SyncConfig, TimelineConfig, Viewport,
};
pub use geometry::{Bounds, Point, Size, angle, distance};
pub use id::ItemId;
pub use model::*;
pub use timeline::{CalendarDay, Edge, Extension, ScrollOutcome, Timeline};

// Re-export the date type so downstream crates don't need a direct dependency
pub use chrono::NaiveDate;
