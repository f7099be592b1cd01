//! Order lifecycle events.

use serde::{Deserialize, Serialize};

/// A trigger that may advance an order to another state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    /// Payment was received.
    Pay,

    /// The order was shipped to the customer.
    Fulfill,

    /// The order was called off.
    Cancel,
}

impl OrderEvent {
    pub const ALL: [OrderEvent; 3] = [OrderEvent::Pay, OrderEvent::Fulfill, OrderEvent::Cancel];

    /// Returns the event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEvent::Pay => "PAY",
            OrderEvent::Fulfill => "FULFILL",
            OrderEvent::Cancel => "CANCEL",
        }
    }
}

impl std::fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
