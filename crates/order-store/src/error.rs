use thiserror::Error;

use crate::EntityId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the requested id.
    #[error("Order not found: {0}")]
    NotFound(EntityId),

    /// The stored state did not match the expected state during a
    /// compare-and-set update.
    #[error("Concurrency conflict for order {id}: expected state {expected}, found {actual}")]
    Conflict {
        id: EntityId,
        expected: String,
        actual: String,
    },

    /// The store refused the operation without reaching a backend.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
