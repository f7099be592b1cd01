//! Runner error types.

use domain::OrderError;
use order_store::StoreError;
use thiserror::Error;

/// Errors that stop the demo run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Connecting to the database failed.
    #[error("Database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    /// Preparing the store (e.g. running migrations) failed.
    #[error("Store setup failed: {0}")]
    Store(#[from] StoreError),

    /// An order operation failed.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A transition the demo relies on was rejected.
    #[error("Unexpected rejection of {event} for order {order_id}")]
    Rejected { order_id: common::EntityId, event: &'static str },
}
