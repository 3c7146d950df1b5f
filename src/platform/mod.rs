//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (polled key-state table)

pub mod input;

pub use input::KeyState;
