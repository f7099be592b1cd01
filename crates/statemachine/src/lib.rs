//! Table-driven state machine runtime.
//!
//! This crate provides:
//! - `TransitionTable`: declarative `(state, event) -> state` rules
//! - `StateMachine`: a per-entity instance with pre-change interceptors
//!   and post-change listeners
//! - `InstanceRegistry`: one cached instance per entity id
//!
//! Machines know nothing about storage. Persistence is plugged in through
//! interceptors, which run before a transition is committed and can veto it.

pub mod error;
pub mod machine;
pub mod message;
pub mod registry;
pub mod table;

pub use error::{MachineError, TableError};
pub use machine::{
    PreStateChange, SendOutcome, StateChange, StateChangeListener, StateMachine, interceptor,
    listener,
};
pub use message::{ENTITY_ID_KEY, ExtendedState, Message};
pub use registry::{InstanceRegistry, SharedMachine};
pub use table::{MachineEvent, MachineState, TransitionRule, TransitionTable};
