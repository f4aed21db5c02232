//! The state machine handle.
//!
//! A [`StateMachine`] is a cheap, cloneable handle to one machine instance.
//! Reads take shared locks; trigger attempts are serialized per instance by a
//! reentrant lock, so a callback running on the triggering thread may read
//! the machine or trigger nested events, while other threads wait their turn.
//! Asynchronous events and callbacks run on two private dispatch queues that
//! are shut down when the last handle is dropped.

mod catch;
mod dispatch;
mod error;
mod trigger;

pub use catch::{CatchRegistry, ErrorHandler, ErrorSelector};
pub use dispatch::{check_reserved, DispatchTable, Operation, RESERVED_NAMES};
pub use error::{ErrorKind, MachineError, ROOT_CLASS};
pub use trigger::CommitBlock;

use crate::config::MachineConfig;
use crate::core::{Guard, HookKind, Source, State, Transition, TransitionRegistry, NONE};
use crate::logger::Logger;
use crate::observer::{
    check_name, Callback, CallbackKind, HookContext, HookId, HookRegistry, IntoOutcome, Subscriber,
};
use crate::queue::DispatchQueue;
use crate::target::Target;
use parking_lot::{ReentrantMutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};

pub(crate) struct Inner<S: State, T: Target> {
    pub(crate) target: T,
    pub(crate) state: RwLock<Option<S>>,
    pub(crate) initial_state: RwLock<Option<S>>,
    pub(crate) terminals: Vec<S>,
    pub(crate) transitions: RwLock<TransitionRegistry<S, T>>,
    pub(crate) hooks: RwLock<HookRegistry<S, T>>,
    pub(crate) catches: RwLock<CatchRegistry<T>>,
    pub(crate) subscribers: RwLock<Vec<Arc<dyn Subscriber<S>>>>,
    pub(crate) dispatch: RwLock<DispatchTable>,
    pub(crate) config: MachineConfig,
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) event_queue: DispatchQueue,
    pub(crate) callback_queue: DispatchQueue,
    pub(crate) serial: ReentrantMutex<()>,
}

/// Handle to a running state machine.
///
/// ```rust
/// use finite_machine::{MachineBuilder, TransitionBuilder};
/// use finite_machine::state_enum;
///
/// state_enum! {
///     enum Light {
///         Green = "green",
///         Yellow = "yellow",
///         Red = "red",
///     }
/// }
///
/// let machine = MachineBuilder::new()
///     .initial(Light::Green)
///     .event("slow", TransitionBuilder::new().from(Light::Green).to(Light::Yellow))
///     .event("stop", TransitionBuilder::new().from(Light::Yellow).to(Light::Red))
///     .build()
///     .unwrap();
///
/// assert!(machine.can("slow", &[]).unwrap());
/// assert!(machine.trigger("slow", &[]).unwrap());
/// assert_eq!(machine.current(), Some(Light::Yellow));
/// ```
pub struct StateMachine<S: State, T: Target = ()> {
    pub(crate) inner: Arc<Inner<S, T>>,
}

impl<S: State, T: Target> Clone for StateMachine<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Non-owning handle to a machine, for callbacks and tasks that refer back
/// to the machine they are registered on.
pub struct WeakMachine<S: State, T: Target = ()> {
    inner: Weak<Inner<S, T>>,
}

impl<S: State, T: Target> WeakMachine<S, T> {
    /// `None` once every [`StateMachine`] handle has been dropped.
    pub fn upgrade(&self) -> Option<StateMachine<S, T>> {
        self.inner.upgrade().map(|inner| StateMachine { inner })
    }
}

impl<S: State, T: Target> Clone for WeakMachine<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: State, T: Target> StateMachine<S, T> {
    pub(crate) fn new(
        target: T,
        terminals: Vec<S>,
        config: MachineConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                target,
                state: RwLock::new(None),
                initial_state: RwLock::new(None),
                terminals,
                transitions: RwLock::new(TransitionRegistry::new()),
                hooks: RwLock::new(HookRegistry::new()),
                catches: RwLock::new(CatchRegistry::new()),
                subscribers: RwLock::new(Vec::new()),
                dispatch: RwLock::new(DispatchTable::new()),
                config,
                event_queue: DispatchQueue::with_logger("events", Arc::clone(&logger)),
                callback_queue: DispatchQueue::with_logger("callbacks", Arc::clone(&logger)),
                logger,
                serial: ReentrantMutex::new(()),
            }),
        }
    }

    /// Handle that does not keep the machine alive.
    pub fn downgrade(&self) -> WeakMachine<S, T> {
        WeakMachine {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current state, `None` before the initial transition.
    pub fn current(&self) -> Option<S> {
        self.inner.state.read().clone()
    }

    /// State first entered from `none`.
    pub fn initial_state(&self) -> Option<S> {
        self.inner.initial_state.read().clone()
    }

    pub fn is(&self, state: &S) -> bool {
        self.inner.state.read().as_ref() == Some(state)
    }

    pub fn is_any(&self, states: &[S]) -> bool {
        self.inner
            .state
            .read()
            .as_ref()
            .is_some_and(|current| states.contains(current))
    }

    /// Whether `event` would change state from here with these arguments.
    ///
    /// Guards are always evaluated, even when only one transition applies.
    pub fn can(&self, event: &str, args: &[Value]) -> Result<bool, MachineError> {
        let current = self.current();
        self.inner
            .transitions
            .read()
            .can_perform(event, current.as_ref(), &self.inner.target, args)
    }

    pub fn cannot(&self, event: &str, args: &[Value]) -> Result<bool, MachineError> {
        self.can(event, args).map(|can| !can)
    }

    /// Concrete states named by any transition, in declaration order.
    pub fn states(&self) -> Vec<S> {
        self.inner.transitions.read().states()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.inner.transitions.read().event_names()
    }

    /// In a declared terminal state or one whose [`State::is_final`] holds.
    pub fn terminated(&self) -> bool {
        self.inner
            .state
            .read()
            .as_ref()
            .is_some_and(|current| current.is_final() || self.inner.terminals.contains(current))
    }

    pub fn terminals(&self) -> &[S] {
        &self.inner.terminals
    }

    pub fn target(&self) -> &T {
        &self.inner.target
    }

    pub fn config(&self) -> &MachineConfig {
        &self.inner.config
    }

    /// Force the current state without transitions or callbacks.
    pub fn restore(&self, state: Option<S>) {
        let _serial = self.inner.serial.lock();
        *self.inner.state.write() = state;
    }

    /// Queue running `async.<event>` calls.
    pub fn event_queue(&self) -> &DispatchQueue {
        &self.inner.event_queue
    }

    /// Queue running async callbacks.
    pub fn callback_queue(&self) -> &DispatchQueue {
        &self.inner.callback_queue
    }

    /// Register a callback on a built machine.
    pub fn on<F, R>(
        &self,
        kind: HookKind,
        name: &str,
        callback_kind: CallbackKind,
        f: F,
    ) -> Result<HookId, MachineError>
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.register_callback(kind, name, Callback::new(callback_kind, f))
    }

    pub(crate) fn register_callback(
        &self,
        kind: HookKind,
        name: &str,
        callback: Callback<S, T>,
    ) -> Result<HookId, MachineError> {
        let (states, events) = {
            let transitions = self.inner.transitions.read();
            let mut states: Vec<String> = transitions
                .states()
                .iter()
                .map(|state| state.name().to_string())
                .collect();
            states.push(NONE.to_string());
            (states, transitions.event_names())
        };
        check_name(kind, name, &states, &events)?;
        Ok(self.inner.hooks.write().register(kind, name, callback))
    }

    /// Unregister a callback. Returns whether it was registered.
    pub fn off(&self, kind: HookKind, name: &str, id: HookId) -> bool {
        self.inner.hooks.write().unregister(kind, name, id)
    }

    /// Register an error handler; later registrations take precedence.
    pub fn handle(&self, selector: impl Into<ErrorSelector>, handler: ErrorHandler<T>) {
        self.inner
            .catches
            .write()
            .register(selector.into(), handler);
    }

    pub fn subscribe<O>(&self, subscriber: O)
    where
        O: Subscriber<S> + 'static,
    {
        self.inner.subscribers.write().push(Arc::new(subscriber));
    }

    /// Register `from -> to` for each source under `event`.
    pub fn register_transition(
        &self,
        event: &str,
        from: Vec<Source<S>>,
        to: S,
        guards: Vec<Guard<T>>,
        silent: bool,
    ) -> Result<(), MachineError> {
        let states = from.into_iter().map(|source| (source, to.clone())).collect();
        self.add_transition(Transition::new(event, states, guards)?.silent(silent))
    }

    pub(crate) fn add_transition(&self, transition: Transition<S, T>) -> Result<(), MachineError> {
        if self.inner.config.reserved_names_check {
            check_reserved(transition.name())?;
        }
        let events = {
            let mut transitions = self.inner.transitions.write();
            transitions.add(transition);
            transitions.event_names()
        };
        self.inner.dispatch.write().refresh(&events);
        Ok(())
    }

    /// Run the operation registered under `name`.
    ///
    /// `"<event>"` triggers, `"<event>!"` triggers strictly and
    /// `"async.<event>"` queues the event, returning `true` once queued.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<bool, MachineError> {
        let operation = self.inner.dispatch.read().lookup(name)?;
        match operation {
            Operation::Trigger(event) => self.trigger(&event, args),
            Operation::TriggerStrict(event) => self.trigger_strict(&event, args),
            Operation::AsyncTrigger(event) => self.async_trigger(&event, args).map(|()| true),
        }
    }

    /// Transition table, one `event: from -> to` line per transition.
    pub fn inspect(&self) -> String {
        self.inner.transitions.read().to_string()
    }
}

impl<S: State, T: Target> fmt::Debug for StateMachine<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current())
            .field("initial_state", &self.initial_state())
            .field("events", &self.event_names())
            .field("hooks", &self.inner.hooks.read().len())
            .field("event_queue", &self.inner.event_queue)
            .field("callback_queue", &self.inner.callback_queue)
            .finish()
    }
}

impl<S: State, T: Target> fmt::Display for StateMachine<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}
