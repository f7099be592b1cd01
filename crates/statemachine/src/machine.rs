//! Machine instances bound to a single entity.

use std::future::Future;
use std::sync::Arc;

use common::EntityId;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::MachineError;
use crate::message::{ENTITY_ID_KEY, ExtendedState, Message};
use crate::table::{MachineEvent, MachineState, TransitionTable};

/// Snapshot handed to pre-change interceptors.
///
/// Owned so interceptors can move it into the future they return.
#[derive(Debug, Clone)]
pub struct StateChange<S, E> {
    pub entity_id: EntityId,
    pub from: S,
    pub to: S,
    pub message: Message<E>,
    pub extended_state: ExtendedState,
}

/// Hook run before a transition is committed. An `Err` aborts the transition.
pub type PreStateChange<S, E, X> =
    Arc<dyn Fn(StateChange<S, E>) -> BoxFuture<'static, Result<(), X>> + Send + Sync>;

/// Notification run after a transition is committed, with `(from, to)`.
pub type StateChangeListener<S> = Arc<dyn Fn(S, S) + Send + Sync>;

/// Wraps an async closure as a [`PreStateChange`] hook.
pub fn interceptor<S, E, X, F, Fut>(hook: F) -> PreStateChange<S, E, X>
where
    F: Fn(StateChange<S, E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), X>> + Send + 'static,
{
    Arc::new(move |change| hook(change).boxed())
}

/// Wraps a closure as a [`StateChangeListener`].
pub fn listener<S, F>(notify: F) -> StateChangeListener<S>
where
    F: Fn(S, S) + Send + Sync + 'static,
{
    Arc::new(notify)
}

/// Result of sending an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome<S> {
    /// The machine's state after the event was handled.
    pub state: S,
    /// False when no rule matched and the state was left untouched.
    pub accepted: bool,
}

impl<S> SendOutcome<S> {
    /// Returns true if the event caused a transition.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Returns true if the event was not applicable in the current state.
    pub fn rejected(&self) -> bool {
        !self.accepted
    }
}

/// A live evaluator of transitions for one entity.
///
/// Holds the current state and an extended-variable bag. The table is
/// shared configuration; interceptors and listeners are attached per
/// instance.
pub struct StateMachine<S: 'static, E: 'static, X> {
    id: EntityId,
    table: TransitionTable<S, E>,
    state: S,
    variables: ExtendedState,
    interceptors: Vec<PreStateChange<S, E, X>>,
    listeners: Vec<StateChangeListener<S>>,
}

impl<S, E, X> StateMachine<S, E, X>
where
    S: MachineState,
    E: MachineEvent,
{
    /// Creates an instance for `id` in the table's initial state.
    pub fn new(id: EntityId, table: TransitionTable<S, E>) -> Self {
        Self {
            id,
            table,
            state: table.initial(),
            variables: Self::base_variables(id),
            interceptors: Vec::new(),
            listeners: Vec::new(),
        }
    }

    fn base_variables(id: EntityId) -> ExtendedState {
        let mut variables = ExtendedState::new();
        variables.insert(ENTITY_ID_KEY.to_string(), id.as_i64().into());
        variables
    }

    /// Returns the entity this instance is bound to.
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn current_state(&self) -> S {
        self.state
    }

    pub fn extended_state(&self) -> &ExtendedState {
        &self.variables
    }

    pub fn table(&self) -> &TransitionTable<S, E> {
        &self.table
    }

    /// Returns true once the machine has reached a terminal state.
    pub fn is_complete(&self) -> bool {
        self.table.is_terminal(self.state)
    }

    /// Registers a hook run before every committed transition.
    pub fn add_interceptor(&mut self, hook: PreStateChange<S, E, X>) {
        self.interceptors.push(hook);
    }

    /// Registers a notification run after every committed transition.
    pub fn add_listener(&mut self, listener: StateChangeListener<S>) {
        self.listeners.push(listener);
    }

    /// Forces the machine into `state` with the given variables.
    ///
    /// No rule is evaluated and no hook runs. The entity id entry is
    /// always restored in the new variable bag.
    pub fn reset_to(&mut self, state: S, variables: ExtendedState) -> Result<(), MachineError<X>> {
        if !self.table.is_declared(state) {
            return Err(MachineError::UndeclaredState {
                state: state.to_string(),
            });
        }

        self.state = state;
        self.variables = variables;
        self.variables
            .insert(ENTITY_ID_KEY.to_string(), self.id.as_i64().into());

        tracing::trace!(entity_id = %self.id, %state, "machine reset");
        Ok(())
    }

    /// Sends an event to the machine.
    ///
    /// When no rule matches, the state is unchanged and the outcome is
    /// rejected. Otherwise every interceptor runs, in registration order,
    /// before the new state is committed; the first interceptor error
    /// aborts the transition and leaves the machine untouched.
    pub async fn send_event(
        &mut self,
        message: Message<E>,
    ) -> Result<SendOutcome<S>, MachineError<X>> {
        if message.entity_id() != self.id {
            return Err(MachineError::CorrelationMismatch {
                machine: self.id,
                message: message.entity_id(),
            });
        }

        let from = self.state;
        let event = message.event();

        let Some(to) = self.table.lookup(from, event) else {
            tracing::debug!(entity_id = %self.id, state = %from, %event, "event not accepted");
            return Ok(SendOutcome {
                state: from,
                accepted: false,
            });
        };

        if !self.interceptors.is_empty() {
            let change = StateChange {
                entity_id: self.id,
                from,
                to,
                message: message.clone(),
                extended_state: self.variables.clone(),
            };
            for hook in &self.interceptors {
                hook(change.clone()).await.map_err(MachineError::Interceptor)?;
            }
        }

        self.state = to;
        for (name, value) in message.headers() {
            self.variables.insert(name.clone(), value.clone());
        }

        for notify in &self.listeners {
            notify(from, to);
        }

        Ok(SendOutcome {
            state: to,
            accepted: true,
        })
    }
}

impl<S: std::fmt::Debug + 'static, E: 'static, X> std::fmt::Debug for StateMachine<S, E, X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("variables", &self.variables)
            .field("interceptors", &self.interceptors.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
