//! Declarative transition tables.

use std::collections::HashSet;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::error::TableError;

/// Trait for the states a machine can be in.
pub trait MachineState: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {}

impl<T> MachineState for T where T: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {}

/// Trait for the events that drive a machine.
pub trait MachineEvent: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {}

impl<T> MachineEvent for T where T: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {}

/// A single `(source, event) -> target` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule<S, E> {
    pub source: S,
    pub event: E,
    pub target: S,
}

impl<S, E> TransitionRule<S, E> {
    /// Creates a rule moving from `source` to `target` on `event`.
    pub const fn new(source: S, event: E, target: S) -> Self {
        Self {
            source,
            event,
            target,
        }
    }
}

/// Immutable transition configuration shared by every machine instance.
///
/// Tables are plain data over `'static` slices so they can be declared as
/// `const` items and validated once at startup.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable<S: 'static, E: 'static> {
    initial: S,
    states: &'static [S],
    end_states: &'static [S],
    rules: &'static [TransitionRule<S, E>],
}

impl<S: MachineState, E: MachineEvent> TransitionTable<S, E> {
    /// Creates a table. Call [`TransitionTable::validate`] before use.
    pub const fn new(
        initial: S,
        states: &'static [S],
        end_states: &'static [S],
        rules: &'static [TransitionRule<S, E>],
    ) -> Self {
        Self {
            initial,
            states,
            end_states,
            rules,
        }
    }

    /// Returns the state new instances start in.
    pub fn initial(&self) -> S {
        self.initial
    }

    /// Returns every declared state.
    pub fn states(&self) -> &'static [S] {
        self.states
    }

    /// Returns the terminal states.
    pub fn end_states(&self) -> &'static [S] {
        self.end_states
    }

    /// Returns the declared rules in declaration order.
    pub fn rules(&self) -> &'static [TransitionRule<S, E>] {
        self.rules
    }

    /// Returns true if `state` belongs to the declared state set.
    pub fn is_declared(&self, state: S) -> bool {
        self.states.contains(&state)
    }

    /// Returns true if `state` is terminal.
    pub fn is_terminal(&self, state: S) -> bool {
        self.end_states.contains(&state)
    }

    /// Looks up the target state for `event` fired in `source`.
    ///
    /// Returns `None` when no rule matches.
    pub fn lookup(&self, source: S, event: E) -> Option<S> {
        self.rules
            .iter()
            .find(|rule| rule.source == source && rule.event == event)
            .map(|rule| rule.target)
    }

    /// Returns the events accepted in `state`, in declaration order.
    pub fn events_from(&self, state: S) -> Vec<E> {
        self.rules
            .iter()
            .filter(|rule| rule.source == state)
            .map(|rule| rule.event)
            .collect()
    }

    /// Checks the table for structural errors.
    pub fn validate(&self) -> Result<(), TableError> {
        if !self.is_declared(self.initial) {
            return Err(TableError::UndeclaredInitial {
                state: self.initial.to_string(),
            });
        }

        for end in self.end_states {
            if !self.is_declared(*end) {
                return Err(TableError::UndeclaredState {
                    state: end.to_string(),
                });
            }
        }

        let mut seen = HashSet::with_capacity(self.rules.len());
        for rule in self.rules {
            for state in [rule.source, rule.target] {
                if !self.is_declared(state) {
                    return Err(TableError::UndeclaredState {
                        state: state.to_string(),
                    });
                }
            }
            if self.is_terminal(rule.source) {
                return Err(TableError::TerminalHasTransition {
                    state: rule.source.to_string(),
                    event: rule.event.to_string(),
                });
            }
            if !seen.insert((rule.source, rule.event)) {
                return Err(TableError::DuplicateRule {
                    state: rule.source.to_string(),
                    event: rule.event.to_string(),
                });
            }
        }

        Ok(())
    }
}
