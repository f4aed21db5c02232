//! Core state machine types and logic.
//!
//! This module contains the lock-free building blocks of a machine:
//! - State definitions via the `State` trait
//! - Guard predicates for transition control
//! - Transition records and the event registry that resolves them
//! - Hook kinds and the events built when hooks fire
//!
//! Nothing here takes a lock or fires a callback; the `machine` module
//! wraps these types in synchronization and drives them.

mod guard;
mod hook;
mod registry;
mod state;
mod transition;

pub use guard::{Condition, Guard, Predicate};
pub use hook::{HookEvent, HookKind, TransitionEvent};
pub use registry::{Resolution, TransitionRegistry};
pub use state::{state_name, Source, State, ANY, NONE};
pub use transition::Transition;
