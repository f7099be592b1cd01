use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{EntityId, NewOrder, OrderRecord, Result, StoreError, store::OrderStore};

/// In-memory order store implementation for testing.
///
/// Ids are assigned from a process-local sequence starting at 1. Clones
/// share the same underlying records.
#[derive(Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<BTreeMap<EntityId, OrderRecord>>>,
    sequence: Arc<AtomicI64>,
    fail_writes: Arc<AtomicBool>,
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self {
            orders: Arc::default(),
            sequence: Arc::new(AtomicI64::new(1)),
            fail_writes: Arc::default(),
        }
    }
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Returns a copy of every stored order, ordered by id.
    pub async fn all(&self) -> Vec<OrderRecord> {
        self.orders.read().await.values().cloned().collect()
    }

    /// Clears all orders. The id sequence is not reset.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }

    /// Makes every subsequent write fail with `Unavailable` until switched off.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: NewOrder) -> Result<OrderRecord> {
        self.check_writable()?;

        let id = EntityId::new(self.sequence.fetch_add(1, Ordering::SeqCst));
        let record = order.with_id(id);
        self.orders.write().await.insert(id, record.clone());

        tracing::debug!(order_id = %id, state = %record.state, "order saved");
        Ok(record)
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<OrderRecord>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn compare_and_set_state(
        &self,
        id: EntityId,
        expected: &str,
        new_state: &str,
    ) -> Result<OrderRecord> {
        self.check_writable()?;

        let mut orders = self.orders.write().await;
        let record = orders.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if record.state != expected {
            return Err(StoreError::Conflict {
                id,
                expected: expected.to_string(),
                actual: record.state.clone(),
            });
        }

        record.state = new_state.to_string();
        Ok(record.clone())
    }
}
