//! Integration tests for the order lifecycle.
//!
//! These tests drive `OrderService` end to end against the in-memory store,
//! checking both the returned outcome and what was persisted.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::EntityId;
use domain::{OrderError, OrderEvent, OrderService, OrderState};
use order_store::{
    InMemoryOrderStore, NewOrder, OrderRecord, OrderStore, OrderStoreExt, StoreError,
};
use statemachine::Message;

/// Helper to create a test order service
fn create_service() -> (OrderService<InMemoryOrderStore>, InMemoryOrderStore) {
    let store = InMemoryOrderStore::new();
    let service = OrderService::new(store.clone()).unwrap();
    (service, store)
}

async fn stored_state(store: &impl OrderStore, id: EntityId) -> String {
    store.get_required(id).await.unwrap().state
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn create_persists_submitted_order() {
        let (service, store) = create_service();
        let placed = Utc::now();

        let order = service.create(placed).await.unwrap();
        assert_eq!(order.state(), OrderState::Submitted);

        // Reload and rehydrate from the persisted record.
        let record = store.get_required(order.id()).await.unwrap();
        assert_eq!(record.state, "SUBMITTED");
        assert_eq!(record.datetime, placed);

        let reloaded = service.get_order(order.id()).await.unwrap().unwrap();
        assert_eq!(reloaded, order);
    }

    #[tokio::test]
    async fn pay_then_fulfill() {
        let (service, store) = create_service();
        let order = service.create(Utc::now()).await.unwrap();

        let paid = service.pay(order.id(), "conf-1").await.unwrap();
        assert!(paid.accepted);
        assert_eq!(paid.state, OrderState::Paid);
        assert_eq!(stored_state(&store, order.id()).await, "PAID");

        let fulfilled = service.fulfill(order.id()).await.unwrap();
        assert!(fulfilled.accepted);
        assert_eq!(fulfilled.state, OrderState::Fulfilled);
        assert_eq!(stored_state(&store, order.id()).await, "FULFILLED");

        let again = service.fulfill(order.id()).await.unwrap();
        assert!(!again.accepted);
        assert_eq!(again.state, OrderState::Fulfilled);
        assert_eq!(stored_state(&store, order.id()).await, "FULFILLED");
    }

    #[tokio::test]
    async fn paying_twice_is_rejected() {
        let (service, store) = create_service();
        let order = service.create(Utc::now()).await.unwrap();

        assert!(service.pay(order.id(), "conf-1").await.unwrap().accepted);

        let second = service.pay(order.id(), "conf-2").await.unwrap();
        assert!(!second.accepted);
        assert_eq!(second.state, OrderState::Paid);
        assert_eq!(stored_state(&store, order.id()).await, "PAID");
    }

    #[tokio::test]
    async fn canceled_order_cannot_be_paid() {
        let (service, store) = create_service();
        let order = service.create(Utc::now()).await.unwrap();

        let canceled = service.cancel(order.id()).await.unwrap();
        assert!(canceled.accepted);
        assert_eq!(canceled.state, OrderState::Canceled);

        let paid = service.pay(order.id(), "conf-1").await.unwrap();
        assert!(!paid.accepted);
        assert_eq!(paid.state, OrderState::Canceled);
        assert_eq!(stored_state(&store, order.id()).await, "CANCELED");
    }

    #[tokio::test]
    async fn paid_order_cannot_be_canceled() {
        let (service, _store) = create_service();
        let order = service.create(Utc::now()).await.unwrap();
        service.pay(order.id(), "conf-1").await.unwrap();

        let outcome = service.cancel(order.id()).await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.state, OrderState::Paid);
    }

    #[tokio::test]
    async fn fulfill_before_pay_is_rejected() {
        let (service, store) = create_service();
        let order = service.create(Utc::now()).await.unwrap();

        let outcome = service.fulfill(order.id()).await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.state, OrderState::Submitted);
        assert_eq!(stored_state(&store, order.id()).await, "SUBMITTED");
    }

    #[tokio::test]
    async fn terminal_orders_reject_every_event() {
        let (service, _store) = create_service();

        let fulfilled = service.create(Utc::now()).await.unwrap();
        service.pay(fulfilled.id(), "conf-1").await.unwrap();
        service.fulfill(fulfilled.id()).await.unwrap();

        let canceled = service.create(Utc::now()).await.unwrap();
        service.cancel(canceled.id()).await.unwrap();

        for (id, state) in [
            (fulfilled.id(), OrderState::Fulfilled),
            (canceled.id(), OrderState::Canceled),
        ] {
            for event in OrderEvent::ALL {
                let outcome = service.send(Message::new(event, id)).await.unwrap();
                assert!(!outcome.accepted, "{state} accepted {event}");
                assert_eq!(outcome.state, state);
            }
        }
    }

    #[tokio::test]
    async fn orders_are_independent() {
        let (service, store) = create_service();
        let first = service.create(Utc::now()).await.unwrap();
        let second = service.create(Utc::now()).await.unwrap();

        service.pay(first.id(), "conf-1").await.unwrap();
        service.cancel(second.id()).await.unwrap();

        assert_eq!(stored_state(&store, first.id()).await, "PAID");
        assert_eq!(stored_state(&store, second.id()).await, "CANCELED");
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (service, store) = create_service();
        let existing = service.create(Utc::now()).await.unwrap();
        let before = store.all().await;

        let result = service.pay(EntityId::new(9_999), "x").await;

        assert!(matches!(result, Err(OrderError::NotFound(id)) if id == EntityId::new(9_999)));
        assert_eq!(store.all().await, before);
        assert_eq!(stored_state(&store, existing.id()).await, "SUBMITTED");
    }

    #[tokio::test]
    async fn persistence_failure_commits_nothing() {
        let (service, store) = create_service();
        let order = service.create(Utc::now()).await.unwrap();

        store.fail_writes(true);
        let result = service.pay(order.id(), "conf-1").await;
        assert!(matches!(
            result,
            Err(OrderError::Persistence(StoreError::Unavailable(_)))
        ));
        assert_eq!(stored_state(&store, order.id()).await, "SUBMITTED");

        // The caller may retry the whole operation once storage is back.
        store.fail_writes(false);
        let outcome = service.pay(order.id(), "conf-1").await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.state, OrderState::Paid);
        assert_eq!(stored_state(&store, order.id()).await, "PAID");
    }

    #[tokio::test]
    async fn unknown_stored_state_fails_loudly() {
        let (service, store) = create_service();
        let order = service.create(Utc::now()).await.unwrap();
        store
            .compare_and_set_state(order.id(), "SUBMITTED", "ON_HOLD")
            .await
            .unwrap();

        assert!(matches!(
            service.pay(order.id(), "conf-1").await,
            Err(OrderError::UnknownState(_))
        ));
        assert!(matches!(
            service.get_order(order.id()).await,
            Err(OrderError::UnknownState(_))
        ));
    }
}

mod concurrency {
    use super::*;

    /// Store where another writer wins the next few compare-and-set calls,
    /// leaving the record in `interloper_state`.
    struct RacingStore {
        inner: InMemoryOrderStore,
        races: AtomicUsize,
        interloper_state: &'static str,
    }

    impl RacingStore {
        fn new(races: usize, interloper_state: &'static str) -> Self {
            Self {
                inner: InMemoryOrderStore::new(),
                races: AtomicUsize::new(races),
                interloper_state,
            }
        }
    }

    #[async_trait]
    impl OrderStore for RacingStore {
        async fn save(&self, order: NewOrder) -> order_store::Result<OrderRecord> {
            self.inner.save(order).await
        }

        async fn find_by_id(&self, id: EntityId) -> order_store::Result<Option<OrderRecord>> {
            self.inner.find_by_id(id).await
        }

        async fn compare_and_set_state(
            &self,
            id: EntityId,
            expected: &str,
            new_state: &str,
        ) -> order_store::Result<OrderRecord> {
            let raced = self
                .races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if !raced {
                return self.inner.compare_and_set_state(id, expected, new_state).await;
            }

            let current = self.inner.get_required(id).await?;
            self.inner
                .compare_and_set_state(id, &current.state, self.interloper_state)
                .await?;
            Err(StoreError::Conflict {
                id,
                expected: expected.to_string(),
                actual: self.interloper_state.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn conflict_is_retried_against_fresh_state() {
        let service = OrderService::new(RacingStore::new(1, "CANCELED")).unwrap();
        let order = service.create(Utc::now()).await.unwrap();

        // The interloper cancels the order before our PAY lands. The retry
        // sees CANCELED and the table rejects PAY.
        let outcome = service.pay(order.id(), "conf-1").await.unwrap();

        assert!(!outcome.accepted);
        assert_eq!(outcome.state, OrderState::Canceled);
        assert_eq!(stored_state(service.store(), order.id()).await, "CANCELED");
    }

    #[tokio::test]
    async fn conflict_retry_can_still_succeed() {
        // The interloper rewrites the state we expected, so the retry goes
        // through.
        let service = OrderService::new(RacingStore::new(1, "SUBMITTED")).unwrap();
        let order = service.create(Utc::now()).await.unwrap();

        let outcome = service.pay(order.id(), "conf-1").await.unwrap();

        assert!(outcome.accepted);
        assert_eq!(outcome.state, OrderState::Paid);
    }

    /// Store whose compare-and-set always loses.
    struct AlwaysConflicting(InMemoryOrderStore);

    #[async_trait]
    impl OrderStore for AlwaysConflicting {
        async fn save(&self, order: NewOrder) -> order_store::Result<OrderRecord> {
            self.0.save(order).await
        }

        async fn find_by_id(&self, id: EntityId) -> order_store::Result<Option<OrderRecord>> {
            self.0.find_by_id(id).await
        }

        async fn compare_and_set_state(
            &self,
            id: EntityId,
            expected: &str,
            _new_state: &str,
        ) -> order_store::Result<OrderRecord> {
            Err(StoreError::Conflict {
                id,
                expected: expected.to_string(),
                actual: "UNKNOWN".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn second_conflict_is_surfaced() {
        let service = OrderService::new(AlwaysConflicting(InMemoryOrderStore::new())).unwrap();
        let order = service.create(Utc::now()).await.unwrap();

        let result = service.pay(order.id(), "conf-1").await;

        assert!(matches!(result, Err(OrderError::Conflict { .. })));
        assert_eq!(stored_state(service.store(), order.id()).await, "SUBMITTED");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_payments_advance_once() {
        let store = InMemoryOrderStore::new();
        let service = Arc::new(OrderService::new(store.clone()).unwrap());
        let order = service.create(Utc::now()).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let service = service.clone();
                let id = order.id();
                tokio::spawn(async move { service.pay(id, &format!("conf-{n}")).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            assert_eq!(outcome.state, OrderState::Paid);
            if outcome.accepted {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(stored_state(&store, order.id()).await, "PAID");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pay_and_cancel_race_has_one_winner() {
        let store = InMemoryOrderStore::new();
        let service = Arc::new(OrderService::new(store.clone()).unwrap());
        let order = service.create(Utc::now()).await.unwrap();
        let id = order.id();

        let pay = tokio::spawn({
            let service = service.clone();
            async move { service.pay(id, "conf-1").await }
        });
        let cancel = tokio::spawn({
            let service = service.clone();
            async move { service.cancel(id).await }
        });

        let pay = pay.await.unwrap().unwrap();
        let cancel = cancel.await.unwrap().unwrap();

        assert!(pay.accepted ^ cancel.accepted);
        let expected = if pay.accepted { "PAID" } else { "CANCELED" };
        assert_eq!(stored_state(&store, id).await, expected);
    }
}
