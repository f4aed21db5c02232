//! Hook registration and the values callbacks run with.
//!
//! Callbacks are stored per hook kind and state or event name. Each carries a
//! [`CallbackKind`] tag deciding whether it runs inline, once, or on the
//! machine's callback queue. Extra observers implement [`Subscriber`] and see
//! every hook event after the machine's own callbacks.

mod callback;
mod hooks;

pub use callback::{
    Callback, CallbackKind, Handler, HookContext, HookId, IntoOutcome, Outcome, CANCELLED,
};
pub use hooks::{check_name, HookRegistry};

use crate::core::{HookEvent, State};
use serde_json::Value;

/// Observer notified of every hook event a machine fires.
pub trait Subscriber<S: State>: Send + Sync {
    fn visit(&self, hook: &HookEvent<S>, args: &[Value]);
}
