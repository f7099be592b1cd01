//! Order service providing the public API for order operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::EntityId;
use order_store::{NewOrder, OrderStore, OrderStoreExt};
use serde::Serialize;
use statemachine::{ExtendedState, InstanceRegistry, Message};

use super::interceptor::{logging_listener, persistence_interceptor};
use super::{ORDER_TRANSITIONS, Order, OrderEvent, OrderState, PAYMENT_CONFIRMATION_HEADER};
use crate::error::OrderError;

/// Machine registry specialized for orders.
pub type OrderRegistry = InstanceRegistry<OrderState, OrderEvent, OrderError>;

/// Result of dispatching an event to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub order_id: EntityId,
    /// The order's state after the event was handled.
    pub state: OrderState,
    /// False when the event did not apply to the order's state.
    pub accepted: bool,
}

/// Service for managing orders.
///
/// Every event goes through the same path: lock the order's machine,
/// rehydrate it from the stored state, send the event and let the
/// persistence interceptor write the new state before it is committed.
pub struct OrderService<S: OrderStore> {
    store: Arc<S>,
    registry: OrderRegistry,
}

impl<S: OrderStore + 'static> OrderService<S> {
    /// Creates a new order service backed by the given store.
    pub fn new(store: S) -> Result<Self, OrderError> {
        let store = Arc::new(store);
        let registry = InstanceRegistry::new(ORDER_TRANSITIONS)?
            .with_interceptor(persistence_interceptor(store.clone()))
            .with_listener(logging_listener());

        Ok(Self { store, registry })
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the machine registry.
    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    /// Creates a new order placed at `datetime`, in the initial state.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, datetime: DateTime<Utc>) -> Result<Order, OrderError> {
        let record = self
            .store
            .save(NewOrder::new(datetime, ORDER_TRANSITIONS.initial().as_str()))
            .await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %record.id, "order created");

        Ok(Order::try_from(record)?)
    }

    /// Loads an order, or `None` if no record exists.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: EntityId) -> Result<Option<Order>, OrderError> {
        let record = self.store.find_by_id(order_id).await?;
        Ok(record.map(Order::try_from).transpose()?)
    }

    /// Records a payment, carrying the confirmation number with the event.
    #[tracing::instrument(skip(self))]
    pub async fn pay(
        &self,
        order_id: EntityId,
        confirmation_number: &str,
    ) -> Result<TransitionOutcome, OrderError> {
        let message = Message::new(OrderEvent::Pay, order_id)
            .with_header(PAYMENT_CONFIRMATION_HEADER, confirmation_number);
        self.send(message).await
    }

    /// Marks a paid order as fulfilled.
    #[tracing::instrument(skip(self))]
    pub async fn fulfill(&self, order_id: EntityId) -> Result<TransitionOutcome, OrderError> {
        self.send(Message::new(OrderEvent::Fulfill, order_id)).await
    }

    /// Cancels an order that has not been paid yet.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: EntityId) -> Result<TransitionOutcome, OrderError> {
        self.send(Message::new(OrderEvent::Cancel, order_id)).await
    }

    /// Dispatches an arbitrary order event.
    ///
    /// A [`OrderError::Conflict`] is retried once against freshly loaded
    /// state before being returned.
    #[tracing::instrument(
        skip(self, message),
        fields(order_id = %message.entity_id(), event = %message.event())
    )]
    pub async fn send(&self, message: Message<OrderEvent>) -> Result<TransitionOutcome, OrderError> {
        let event = message.event();

        let result = match self.dispatch(message.clone()).await {
            Err(OrderError::Conflict {
                order_id,
                expected,
                actual,
            }) => {
                metrics::counter!("order_transition_conflicts_total").increment(1);
                tracing::warn!(%order_id, %expected, %actual, "concurrent modification, retrying");
                self.dispatch(message).await
            }
            other => other,
        };

        let outcome = match &result {
            Ok(transition) if transition.accepted => "accepted",
            Ok(_) => "rejected",
            Err(_) => "failed",
        };
        metrics::counter!(
            "order_transitions_total",
            "event" => event.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        result
    }

    /// Runs one attempt of an event against the stored order.
    ///
    /// Instances are released once their order is terminal or has no
    /// record, but only when no other task holds the same handle, so there
    /// is never more than one live instance per order in this process.
    /// Writers in other processes are caught by the store's compare-and-set.
    async fn dispatch(&self, message: Message<OrderEvent>) -> Result<TransitionOutcome, OrderError> {
        let order_id = message.entity_id();
        let shared = self.registry.get(order_id).await;
        let mut machine = shared.lock().await;

        let record = match self.store.get_required(order_id).await {
            Ok(record) => record,
            Err(e) => {
                // Don't keep an instance around for an order that doesn't exist.
                self.registry.release(order_id, &shared).await;
                return Err(e.into());
            }
        };
        let order = Order::try_from(record)?;

        machine.reset_to(order.state(), ExtendedState::new())?;
        let sent = machine.send_event(message).await?;

        if machine.is_complete() {
            self.registry.release(order_id, &shared).await;
        }

        Ok(TransitionOutcome {
            order_id,
            state: sent.state,
            accepted: sent.accepted,
        })
    }
}
