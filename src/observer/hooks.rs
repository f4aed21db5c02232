//! Callbacks keyed by hook kind and state or event name.

use crate::core::{HookKind, State, ANY};
use crate::machine::MachineError;
use crate::observer::callback::{Callback, HookId};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of callbacks per `(kind, name)`, in registration order.
pub struct HookRegistry<S: State, T> {
    hooks: HashMap<(HookKind, String), Vec<Arc<Callback<S, T>>>>,
}

impl<S: State, T: 'static> Default for HookRegistry<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, T: 'static> HookRegistry<S, T> {
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: HookKind, name: &str, callback: Callback<S, T>) -> HookId {
        let id = callback.id();
        self.hooks
            .entry((kind, name.to_string()))
            .or_default()
            .push(Arc::new(callback));
        id
    }

    /// Remove a callback by identity. Returns whether it was registered.
    pub fn unregister(&mut self, kind: HookKind, name: &str, id: HookId) -> bool {
        let key = (kind, name.to_string());
        let Some(callbacks) = self.hooks.get_mut(&key) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|callback| callback.id() != id);
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            self.hooks.remove(&key);
        }
        removed
    }

    /// Snapshot of the callbacks under `(kind, name)`.
    pub fn find(&self, kind: HookKind, name: &str) -> Vec<Arc<Callback<S, T>>> {
        self.hooks
            .get(&(kind, name.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Names with at least one callback for `kind`.
    pub fn names(&self, kind: HookKind) -> Vec<&str> {
        self.hooks
            .keys()
            .filter(|(registered, _)| *registered == kind)
            .map(|(_, name)| name.as_str())
            .collect()
    }
}

/// Check that `name` may carry `kind` callbacks.
///
/// State hooks need a declared state, event hooks a declared event; the
/// wildcard is accepted by both.
pub fn check_name(
    kind: HookKind,
    name: &str,
    states: &[String],
    events: &[String],
) -> Result<(), MachineError> {
    if name == ANY {
        return Ok(());
    }
    let is_state = states.iter().any(|state| state == name);
    let is_event = events.iter().any(|event| event == name);
    let reason = match (kind.is_state_hook(), is_state, is_event) {
        (true, true, _) | (false, _, true) => return Ok(()),
        (true, false, true) => "name refers to an event",
        (false, true, false) => "name refers to a state",
        _ => "unknown state or event name",
    };
    Err(MachineError::InvalidCallbackName {
        kind: kind.to_string(),
        name: name.to_string(),
        reason: reason.to_string(),
    })
}
