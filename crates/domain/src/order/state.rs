//! Order lifecycle states.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transitions::ORDER_TRANSITIONS;

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Submitted ──PAY──► Paid ──FULFILL──► Fulfilled
///     │
///     └──CANCEL──► Canceled
/// ```
///
/// Persisted as the upper-case name returned by [`OrderState::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Order has been placed and awaits payment.
    #[default]
    Submitted,

    /// Payment confirmed, awaiting fulfillment.
    Paid,

    /// Order has been fulfilled (terminal state).
    Fulfilled,

    /// Order was canceled before payment (terminal state).
    Canceled,
}

/// A persisted state name that does not match any [`OrderState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order state: {0:?}")]
pub struct UnknownOrderState(pub String);

impl OrderState {
    /// Every declared state.
    pub const ALL: [OrderState; 4] = [
        OrderState::Submitted,
        OrderState::Paid,
        OrderState::Fulfilled,
        OrderState::Canceled,
    ];

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        ORDER_TRANSITIONS.is_terminal(*self)
    }

    /// Returns the persisted state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Submitted => "SUBMITTED",
            OrderState::Paid => "PAID",
            OrderState::Fulfilled => "FULFILLED",
            OrderState::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = UnknownOrderState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownOrderState(s.to_string()))
    }
}
