//! Order domain for the state machine runtime.
//!
//! This crate provides:
//! - `OrderState` and `OrderEvent`, persisted by name
//! - `ORDER_TRANSITIONS`, the declared order lifecycle
//! - A persistence interceptor that writes each transition before it commits
//! - `OrderService`, the entry point for creating and advancing orders

pub mod error;
pub mod order;

pub use error::OrderError;
pub use order::{
    ORDER_TRANSITIONS, Order, OrderEvent, OrderRegistry, OrderService, OrderState,
    PAYMENT_CONFIRMATION_HEADER, TransitionOutcome, UnknownOrderState, logging_listener,
    persistence_interceptor,
};
