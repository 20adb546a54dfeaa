pub mod board;
pub mod drag;
pub mod input;
pub mod persist;
pub mod store;
