//! The order transition table.

use statemachine::{TransitionRule, TransitionTable};

use super::{OrderEvent, OrderState};

/// Every legal order move. Anything not listed here is rejected.
pub const ORDER_TRANSITIONS: TransitionTable<OrderState, OrderEvent> = TransitionTable::new(
    OrderState::Submitted,
    &OrderState::ALL,
    &[OrderState::Fulfilled, OrderState::Canceled],
    &[
        TransitionRule::new(OrderState::Submitted, OrderEvent::Pay, OrderState::Paid),
        TransitionRule::new(OrderState::Paid, OrderEvent::Fulfill, OrderState::Fulfilled),
        TransitionRule::new(OrderState::Submitted, OrderEvent::Cancel, OrderState::Canceled),
    ],
);
