use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// A persisted order row.
///
/// The state is kept as the string name of a lifecycle state; mapping it
/// back to a typed value is the caller's job, and must fail on names it
/// does not recognize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Identity assigned by the store on save.
    pub id: EntityId,

    /// When the order was placed.
    pub datetime: DateTime<Utc>,

    /// Name of the current lifecycle state.
    pub state: String,
}

/// An order that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub datetime: DateTime<Utc>,
    pub state: String,
}

impl NewOrder {
    /// Creates an unsaved order placed at `datetime` in `state`.
    pub fn new(datetime: DateTime<Utc>, state: impl Into<String>) -> Self {
        Self {
            datetime,
            state: state.into(),
        }
    }

    /// Attaches the id assigned by the store.
    pub fn with_id(self, id: EntityId) -> OrderRecord {
        OrderRecord {
            id,
            datetime: self.datetime,
            state: self.state,
        }
    }
}
