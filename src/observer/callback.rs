//! Callback values stored in the hook registry.

use crate::core::{State, TransitionEvent};
use crate::machine::MachineError;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What a callback asks of the transition in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// Turn the pending state change into a no-op.
    Cancelled,
}

/// Sentinel callbacks return to cancel the pending state change.
pub const CANCELLED: Outcome = Outcome::Cancelled;

/// Return types accepted from callback bodies.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Outcome, MachineError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, MachineError> {
        Ok(Outcome::Continue)
    }
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, MachineError> {
        Ok(self)
    }
}

impl IntoOutcome for Result<(), MachineError> {
    fn into_outcome(self) -> Result<Outcome, MachineError> {
        self.map(|()| Outcome::Continue)
    }
}

impl IntoOutcome for Result<Outcome, MachineError> {
    fn into_outcome(self) -> Result<Outcome, MachineError> {
        self
    }
}

/// How a registered callback is run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallbackKind {
    /// Inline, every time.
    #[default]
    Plain,
    /// Inline, then unregistered after its first successful run.
    Once,
    /// On the machine's callback queue; cannot cancel the transition.
    Async,
}

/// Everything a callback body can see.
pub struct HookContext<'a, S: State, T> {
    target: &'a T,
    event: &'a TransitionEvent<S>,
    args: &'a [Value],
}

impl<'a, S: State, T> HookContext<'a, S, T> {
    pub fn new(target: &'a T, event: &'a TransitionEvent<S>, args: &'a [Value]) -> Self {
        Self {
            target,
            event,
            args,
        }
    }

    pub fn target(&self) -> &'a T {
        self.target
    }

    pub fn event(&self) -> &'a TransitionEvent<S> {
        self.event
    }

    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    pub fn from(&self) -> Option<&'a S> {
        self.event.from.as_ref()
    }

    pub fn to(&self) -> Option<&'a S> {
        self.event.to.as_ref()
    }

    /// Abort the trigger with a [`MachineError::Callback`].
    ///
    /// Unlike returning [`CANCELLED`], the error propagates to the caller and
    /// the machine rolls back to the state it had before the trigger.
    pub fn cancel_event(&self, message: impl Into<String>) -> Result<Outcome, MachineError> {
        Err(MachineError::cancel_event(message))
    }
}

/// Callable stored behind a callback.
pub trait Handler<S: State, T>: Send + Sync {
    fn handle(&self, context: &HookContext<'_, S, T>) -> Result<Outcome, MachineError>;
}

impl<S, T, F, R> Handler<S, T> for F
where
    S: State,
    F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync,
    R: IntoOutcome,
{
    fn handle(&self, context: &HookContext<'_, S, T>) -> Result<Outcome, MachineError> {
        self(context).into_outcome()
    }
}

/// Identity of a registered callback, used to unregister it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u64);

impl HookId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        HookId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A tagged callback.
pub struct Callback<S: State, T> {
    id: HookId,
    kind: CallbackKind,
    handler: Arc<dyn Handler<S, T>>,
}

impl<S: State, T: 'static> Callback<S, T> {
    pub fn new<H>(kind: CallbackKind, handler: H) -> Self
    where
        H: Handler<S, T> + 'static,
    {
        Self {
            id: HookId::next(),
            kind,
            handler: Arc::new(handler),
        }
    }

    pub fn id(&self) -> HookId {
        self.id
    }

    pub fn kind(&self) -> CallbackKind {
        self.kind
    }

    pub fn call(&self, context: &HookContext<'_, S, T>) -> Result<Outcome, MachineError> {
        self.handler.handle(context)
    }
}

impl<S: State, T> fmt::Debug for Callback<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
