//! Domain error types.

use common::EntityId;
use order_store::StoreError;
use statemachine::{MachineError, TableError};
use thiserror::Error;

use crate::order::UnknownOrderState;

/// Errors that can occur during order operations.
///
/// An event that does not apply to the order's current state is not an
/// error; it comes back as a rejected
/// [`TransitionOutcome`](crate::TransitionOutcome).
#[derive(Debug, Error)]
pub enum OrderError {
    /// No durable record exists for the order.
    #[error("Order not found: {0}")]
    NotFound(EntityId),

    /// Reading or writing the durable record failed. Nothing was committed.
    #[error("Persistence failure: {0}")]
    Persistence(#[source] StoreError),

    /// The stored state moved underneath an in-flight transition.
    #[error("Concurrent modification of order {order_id}: expected {expected}, found {actual}")]
    Conflict {
        order_id: EntityId,
        expected: String,
        actual: String,
    },

    /// The stored state name is not a known state.
    #[error(transparent)]
    UnknownState(#[from] UnknownOrderState),

    /// The transition table failed validation.
    #[error("Invalid transition table: {0}")]
    Configuration(#[from] TableError),

    /// The state machine was misused (wrong correlation, undeclared state).
    #[error("State machine error: {0}")]
    Machine(String),
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => OrderError::NotFound(id),
            StoreError::Conflict {
                id,
                expected,
                actual,
            } => OrderError::Conflict {
                order_id: id,
                expected,
                actual,
            },
            other => OrderError::Persistence(other),
        }
    }
}

impl From<MachineError<OrderError>> for OrderError {
    fn from(e: MachineError<OrderError>) -> Self {
        match e {
            MachineError::Interceptor(inner) => inner,
            other => OrderError::Machine(other.to_string()),
        }
    }
}
