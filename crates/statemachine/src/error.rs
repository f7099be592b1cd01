//! State machine error types.

use common::EntityId;
use thiserror::Error;

/// Structural problems found while validating a transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The initial state is not part of the declared state set.
    #[error("Initial state {state} is not declared")]
    UndeclaredInitial { state: String },

    /// A rule or end state references a state outside the declared set.
    #[error("State {state} is referenced but not declared")]
    UndeclaredState { state: String },

    /// A terminal state has an outgoing rule.
    #[error("Terminal state {state} has an outgoing transition on {event}")]
    TerminalHasTransition { state: String, event: String },

    /// Two rules share the same source state and event.
    #[error("Duplicate transition from {state} on {event}")]
    DuplicateRule { state: String, event: String },
}

/// Errors returned by a machine instance.
///
/// `X` is the error type produced by the instance's pre-change interceptors.
/// An event that has no matching rule is not an error; see
/// [`SendOutcome`](crate::SendOutcome).
#[derive(Debug, Error)]
pub enum MachineError<X> {
    /// The machine was asked to adopt a state the table does not declare.
    #[error("State {state} is not declared in the transition table")]
    UndeclaredState { state: String },

    /// The message is correlated with a different entity than the machine.
    #[error("Message for entity {message} sent to machine {machine}")]
    CorrelationMismatch { machine: EntityId, message: EntityId },

    /// A pre-change interceptor refused the transition.
    #[error("Transition aborted by interceptor: {0}")]
    Interceptor(X),
}
