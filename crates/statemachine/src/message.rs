//! Event messages and extended state.

use std::collections::HashMap;

use common::EntityId;
use serde::{Deserialize, Serialize};

/// Key under which every machine records the entity it is bound to.
pub const ENTITY_ID_KEY: &str = "entityId";

/// Arbitrary key/value context carried by a machine instance.
pub type ExtendedState = HashMap<String, serde_json::Value>;

/// An event sent to a machine, correlated with one entity.
///
/// Headers carry event-supplied metadata (for example a payment
/// confirmation number). They are merged into the machine's extended
/// state when the event is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<E> {
    event: E,
    entity_id: EntityId,
    headers: HashMap<String, serde_json::Value>,
}

impl<E: Copy> Message<E> {
    /// Creates a message with no headers.
    pub fn new(event: E, entity_id: EntityId) -> Self {
        Self {
            event,
            entity_id,
            headers: HashMap::new(),
        }
    }

    /// Adds a header, replacing any previous value under the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns the event kind.
    pub fn event(&self) -> E {
        self.event
    }

    /// Returns the correlated entity.
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Returns a header value.
    pub fn header(&self, name: &str) -> Option<&serde_json::Value> {
        self.headers.get(name)
    }

    /// Returns a header value as a string slice, if it is a JSON string.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(serde_json::Value::as_str)
    }

    /// Returns all headers.
    pub fn headers(&self) -> &HashMap<String, serde_json::Value> {
        &self.headers
    }
}
