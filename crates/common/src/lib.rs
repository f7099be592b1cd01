//! Shared types for the order state machine system.

pub mod types;

pub use types::EntityId;
