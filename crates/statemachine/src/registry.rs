//! Per-entity machine registry.

use std::collections::HashMap;
use std::sync::Arc;

use common::EntityId;
use tokio::sync::{Mutex, RwLock};

use crate::error::TableError;
use crate::machine::{PreStateChange, StateChangeListener, StateMachine};
use crate::table::{MachineEvent, MachineState, TransitionTable};

/// A cached machine instance.
///
/// The mutex is the per-entity lock: hold it across rehydrate, send and
/// persist so two requests for the same entity cannot interleave.
pub type SharedMachine<S, E, X> = Arc<Mutex<StateMachine<S, E, X>>>;

/// Keyed factory and cache of machine instances.
///
/// Every instance built by the registry shares its table and receives the
/// registry's interceptors and listeners. The registry never touches
/// durable storage; callers rehydrate instances with
/// [`StateMachine::reset_to`] before sending events.
pub struct InstanceRegistry<S: 'static, E: 'static, X> {
    table: TransitionTable<S, E>,
    interceptors: Vec<PreStateChange<S, E, X>>,
    listeners: Vec<StateChangeListener<S>>,
    instances: RwLock<HashMap<EntityId, SharedMachine<S, E, X>>>,
}

impl<S, E, X> InstanceRegistry<S, E, X>
where
    S: MachineState,
    E: MachineEvent,
{
    /// Creates a registry for `table`, validating it first.
    pub fn new(table: TransitionTable<S, E>) -> Result<Self, TableError> {
        table.validate()?;
        Ok(Self {
            table,
            interceptors: Vec::new(),
            listeners: Vec::new(),
            instances: RwLock::new(HashMap::new()),
        })
    }

    /// Adds an interceptor attached to every instance built from now on.
    pub fn with_interceptor(mut self, hook: PreStateChange<S, E, X>) -> Self {
        self.interceptors.push(hook);
        self
    }

    /// Adds a listener attached to every instance built from now on.
    pub fn with_listener(mut self, listener: StateChangeListener<S>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn table(&self) -> &TransitionTable<S, E> {
        &self.table
    }

    /// Returns the instance for `id`, building it on first access.
    pub async fn get(&self, id: EntityId) -> SharedMachine<S, E, X> {
        if let Some(machine) = self.instances.read().await.get(&id) {
            return machine.clone();
        }

        let mut instances = self.instances.write().await;
        instances
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!(entity_id = %id, "building machine instance");
                Arc::new(Mutex::new(self.build(id)))
            })
            .clone()
    }

    fn build(&self, id: EntityId) -> StateMachine<S, E, X> {
        let mut machine = StateMachine::new(id, self.table);
        for hook in &self.interceptors {
            machine.add_interceptor(hook.clone());
        }
        for listener in &self.listeners {
            machine.add_listener(listener.clone());
        }
        machine
    }

    /// Stops and forgets the instance for `id`.
    ///
    /// Returns true if an instance was cached. Holders of the previous
    /// handle keep a detached copy; the next [`get`](Self::get) builds a
    /// fresh one.
    pub async fn evict(&self, id: EntityId) -> bool {
        self.instances.write().await.remove(&id).is_some()
    }

    /// Forgets the instance for `id` if `handle` is the cached instance and
    /// no one else holds it.
    ///
    /// The check and the removal happen under the registry's write lock, so
    /// no [`get`](Self::get) can hand the instance out in between. When
    /// other tasks still hold or wait on `handle`, the instance stays cached
    /// and the last of them releases it. Returns true if it was removed.
    pub async fn release(&self, id: EntityId, handle: &SharedMachine<S, E, X>) -> bool {
        let mut instances = self.instances.write().await;
        let unshared = instances
            .get(&id)
            .is_some_and(|cached| Arc::ptr_eq(cached, handle) && Arc::strong_count(handle) == 2);
        if unshared {
            instances.remove(&id);
        }
        unshared
    }

    pub async fn contains(&self, id: EntityId) -> bool {
        self.instances.read().await.contains_key(&id)
    }

    /// Returns the number of cached instances.
    pub async fn len(&self) -> usize {
        self.instances.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.instances.read().await.is_empty()
    }
}
