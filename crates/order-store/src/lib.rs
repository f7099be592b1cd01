//! Durable storage for order records.
//!
//! Records keep their lifecycle state as a plain string; the domain layer
//! owns the mapping to typed states.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::EntityId;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use record::{NewOrder, OrderRecord};
pub use store::{OrderStore, OrderStoreExt};
