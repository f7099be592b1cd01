//! Hooks that tie order machines to durable storage.

use std::sync::Arc;

use order_store::{OrderStore, OrderStoreExt};
use statemachine::{PreStateChange, StateChange, StateChangeListener, interceptor, listener};

use super::{OrderEvent, OrderState, PAYMENT_CONFIRMATION_HEADER};
use crate::error::OrderError;

/// Builds the pre-change hook that writes every transition to `store`.
///
/// The hook runs before the machine commits, so a storage failure leaves
/// the in-memory state untouched.
pub fn persistence_interceptor<S>(store: Arc<S>) -> PreStateChange<OrderState, OrderEvent, OrderError>
where
    S: OrderStore + 'static,
{
    interceptor(move |change| persist_transition(store.clone(), change))
}

async fn persist_transition<S>(
    store: Arc<S>,
    change: StateChange<OrderState, OrderEvent>,
) -> Result<(), OrderError>
where
    S: OrderStore + 'static,
{
    let order_id = change.message.entity_id();
    let record = store.get_required(order_id).await?;

    let stored: OrderState = record.state.parse()?;
    if stored != change.from {
        return Err(OrderError::Conflict {
            order_id,
            expected: change.from.to_string(),
            actual: stored.to_string(),
        });
    }

    store
        .compare_and_set_state(order_id, change.from.as_str(), change.to.as_str())
        .await?;

    tracing::debug!(
        %order_id,
        from = %change.from,
        to = %change.to,
        event = %change.message.event(),
        confirmation = change.message.header_str(PAYMENT_CONFIRMATION_HEADER),
        "order state persisted"
    );
    Ok(())
}

/// Builds the post-change listener that logs every committed transition.
pub fn logging_listener() -> StateChangeListener<OrderState> {
    listener(|from: OrderState, to: OrderState| {
        tracing::info!(%from, %to, "order state changed");
    })
}
