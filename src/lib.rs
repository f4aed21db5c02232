//! Finite Machine: a finite-state-machine engine with lifecycle callbacks
//!
//! A machine tracks a current state, resolves events to guarded
//! transitions and fires callbacks around each state change. Callbacks can run
//! inline, once, or on a background queue, and any of them may cancel the
//! pending change.
//!
//! # Core Concepts
//!
//! - **State**: Type-safe state representation via the `State` trait
//! - **Transitions**: `from -> to` mappings registered under an event name,
//!   optionally guarded; several transitions sharing a source form a choice
//! - **Hooks**: `before`/`after` an event, `exit`/`transition`/`enter` a state,
//!   for a named state or event or for any of them
//! - **Target**: an object whose methods guards and error handlers may call
//!
//! # Example
//!
//! ```rust
//! use finite_machine::{HookContext, MachineBuilder, TransitionBuilder};
//! use finite_machine::state_enum;
//! use std::sync::{Arc, Mutex};
//!
//! state_enum! {
//!     enum Light {
//!         Green = "green",
//!         Yellow = "yellow",
//!         Red = "red",
//!     }
//!     final: [Red]
//! }
//!
//! let entered = Arc::new(Mutex::new(Vec::new()));
//! let log = Arc::clone(&entered);
//!
//! let machine = MachineBuilder::new()
//!     .initial(Light::Green)
//!     .event("slow", TransitionBuilder::new().from(Light::Green).to(Light::Yellow))
//!     .event("stop", TransitionBuilder::new().from(Light::Yellow).to(Light::Red))
//!     .on_enter("red", move |ctx: &HookContext<'_, Light, ()>| {
//!         log.lock().unwrap().push(ctx.event().to_string());
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert!(machine.trigger("slow", &[]).unwrap());
//! assert!(!machine.trigger("slow", &[]).unwrap());
//! assert!(machine.trigger("stop", &[]).unwrap());
//! assert!(machine.terminated());
//! assert_eq!(*entered.lock().unwrap(), vec!["stop: yellow -> red"]);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod logger;
pub mod machine;
pub mod observer;
pub mod queue;
pub mod target;

// Re-export commonly used types
pub use crate::builder::{BuildError, ChoiceBuilder, MachineBuilder, TransitionBuilder};
pub use crate::config::{HookOrder, InitialOptions, MachineConfig};
pub use crate::core::{Guard, HookKind, Source, State, TransitionEvent, ANY, NONE};
pub use crate::machine::{
    ErrorHandler, ErrorKind, ErrorSelector, MachineError, StateMachine, WeakMachine,
};
pub use crate::observer::{CallbackKind, HookContext, HookId, Outcome, Subscriber, CANCELLED};
pub use crate::queue::{DispatchQueue, QueueError, Task};
pub use crate::target::{Target, TargetError};
