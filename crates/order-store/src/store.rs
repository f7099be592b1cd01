use async_trait::async_trait;

use crate::{EntityId, NewOrder, OrderRecord, Result, StoreError};

/// Core trait for order store implementations.
///
/// The store is the single writer of truth for order state. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order and returns it with its assigned id.
    async fn save(&self, order: NewOrder) -> Result<OrderRecord>;

    /// Retrieves an order by id.
    ///
    /// Returns None if no record exists.
    async fn find_by_id(&self, id: EntityId) -> Result<Option<OrderRecord>>;

    /// Atomically replaces the state of an order.
    ///
    /// The update only happens if the stored state equals `expected`;
    /// otherwise the call fails with `Conflict` and nothing is written.
    /// Fails with `NotFound` if the record does not exist.
    async fn compare_and_set_state(
        &self,
        id: EntityId,
        expected: &str,
        new_state: &str,
    ) -> Result<OrderRecord>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Retrieves an order that must exist.
    ///
    /// Absence is reported as `NotFound`; use this where a missing record
    /// means the caller's view of the store is inconsistent.
    async fn get_required(&self, id: EntityId) -> Result<OrderRecord> {
        self.find_by_id(id).await?.ok_or(StoreError::NotFound(id))
    }

    /// Checks if an order exists.
    async fn exists(&self, id: EntityId) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
