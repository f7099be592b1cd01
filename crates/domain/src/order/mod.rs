//! Order lifecycle: states, events, transition table and service.

mod entity;
mod events;
mod interceptor;
mod service;
mod state;
mod transitions;

pub use entity::Order;
pub use events::OrderEvent;
pub use interceptor::{logging_listener, persistence_interceptor};
pub use service::{OrderRegistry, OrderService, TransitionOutcome};
pub use state::{OrderState, UnknownOrderState};
pub use transitions::ORDER_TRANSITIONS;

/// Header carrying the payment confirmation number on `PAY` messages.
pub const PAYMENT_CONFIRMATION_HEADER: &str = "paymentConfirmationNumber";
