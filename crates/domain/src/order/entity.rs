//! Typed view of a persisted order.

use chrono::{DateTime, Utc};
use common::EntityId;
use order_store::OrderRecord;
use serde::Serialize;

use super::{OrderState, UnknownOrderState};

/// An order as read from the store.
///
/// Built from an [`OrderRecord`]; conversion fails if the stored state
/// name is not a known [`OrderState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    id: EntityId,
    datetime: DateTime<Utc>,
    state: OrderState,
}

impl Order {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns when the order was placed.
    pub fn datetime(&self) -> DateTime<Utc> {
        self.datetime
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    /// Returns true if the order has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = UnknownOrderState;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            datetime: record.datetime,
            state: record.state.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str) -> OrderRecord {
        OrderRecord {
            id: EntityId::new(1),
            datetime: Utc::now(),
            state: state.to_string(),
        }
    }

    #[test]
    fn test_from_record() {
        let record = record("PAID");
        let order = Order::try_from(record.clone()).unwrap();

        assert_eq!(order.id(), record.id);
        assert_eq!(order.datetime(), record.datetime);
        assert_eq!(order.state(), OrderState::Paid);
        assert!(!order.is_terminal());
    }

    #[test]
    fn test_unknown_state_fails_loudly() {
        let result = Order::try_from(record("LOST_IN_TRANSIT"));
        assert_eq!(
            result,
            Err(UnknownOrderState("LOST_IN_TRANSIT".to_string()))
        );
    }
}
