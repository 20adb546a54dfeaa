//! Board configuration.
//!
//! Every section has `Default` values matching the stock board, and every
//! field may be omitted from the JSON form.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("invalid board config: {0}")]
pub struct ConfigError(#[from] serde_json::Error);

/// The canvas (viewport) dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    pub timeline: TimelineConfig,
    pub connector: ConnectorConfig,
    pub sync: SyncConfig,
}

impl BoardConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }
}

/// Rolling window parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineConfig {
    /// Days materialized before today in the initial window.
    pub days_before: u32,
    /// Total days in the initial window (today included).
    pub initial_days: u32,
    /// Days added per extension at either edge.
    pub batch_days: u32,
    /// Scroll distance from an edge (px) that triggers an extension.
    pub edge_threshold: f64,
    /// Width of one day column (px).
    pub day_width: f64,
    /// Vertical position of the marker row on the board (px).
    pub baseline_y: f64,
    /// How far below the marker row connectors attach (px).
    pub marker_drop: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            days_before: 15,
            initial_days: 45,
            batch_days: 5,
            edge_threshold: 200.0,
            day_width: 140.0,
            baseline_y: 96.0,
            marker_drop: 15.0,
        }
    }
}

/// Which point of an item's box the connector starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnchorMode {
    #[default]
    TopCenter,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorConfig {
    pub anchor: AnchorMode,
    /// Bend as a fraction of the vertical distance between the endpoints.
    pub bend_factor: f64,
    pub min_bend: f64,
    pub max_bend: f64,
    pub dot_radius: f64,
    pub stroke_width: f64,
    pub dash: [f64; 2],
    pub opacity: f64,
    /// Fallback recompute period (ms) for layout shifts nobody reports.
    pub fallback_interval_ms: f64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            anchor: AnchorMode::TopCenter,
            bend_factor: 0.2,
            min_bend: 8.0,
            max_bend: 120.0,
            dot_radius: 5.0,
            stroke_width: 1.5,
            dash: [5.0, 5.0],
            opacity: 0.6,
            fallback_interval_ms: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Attempts per pending write before it is dropped.
    pub max_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}
