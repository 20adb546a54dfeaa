pub mod connector;
pub mod hit;
pub mod paint;
pub mod renderer;

pub use connector::{Connector, anchor_point, build_connector, control_point};
pub use renderer::{ConnectorRenderer, RedrawReason};
