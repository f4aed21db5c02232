//! Event name -> transitions registry and transition resolution.

use crate::core::state::{Source, State};
use crate::core::transition::Transition;
use crate::machine::MachineError;
use crate::target::Target;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of resolving an event from a state.
pub enum Resolution<S: State, T> {
    /// A registered transition applies.
    Defined(Arc<Transition<S, T>>),
    /// Nothing applies; moving "through" it leaves the state unchanged.
    Undefined(String),
}

impl<S: State, T: Target> Resolution<S, T> {
    pub fn to_state(&self, from: Option<&S>) -> Option<S> {
        match self {
            Self::Defined(transition) => transition.to_state(from),
            Self::Undefined(_) => from.cloned(),
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    pub fn transition(&self) -> Option<&Arc<Transition<S, T>>> {
        match self {
            Self::Defined(transition) => Some(transition),
            Self::Undefined(_) => None,
        }
    }

    pub fn into_transition(self) -> Option<Arc<Transition<S, T>>> {
        match self {
            Self::Defined(transition) => Some(transition),
            Self::Undefined(_) => None,
        }
    }

    pub fn event_name(&self) -> &str {
        match self {
            Self::Defined(transition) => transition.name(),
            Self::Undefined(name) => name,
        }
    }
}

/// Ordered mapping of event names to their transitions.
///
/// Registration order is preserved both across events and within one event;
/// within an event it decides which branch wins.
pub struct TransitionRegistry<S: State, T> {
    events: HashMap<String, Vec<Arc<Transition<S, T>>>>,
    order: Vec<String>,
}

impl<S: State, T: Target> Default for TransitionRegistry<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, T: Target> TransitionRegistry<S, T> {
    pub fn new() -> Self {
        Self {
            events: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Append a transition under its event name.
    pub fn add(&mut self, transition: Transition<S, T>) -> Arc<Transition<S, T>> {
        let transition = Arc::new(transition);
        let name = transition.name().to_string();
        if !self.events.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.events
            .entry(name)
            .or_default()
            .push(Arc::clone(&transition));
        transition
    }

    /// Transitions registered for `event`, empty when unknown.
    pub fn find(&self, event: &str) -> &[Arc<Transition<S, T>>] {
        self.events.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    /// Declared from-keys of `event`, registration order, duplicates kept.
    pub fn states_for(&self, event: &str) -> Vec<Source<S>> {
        self.find(event)
            .iter()
            .flat_map(|transition| transition.states().iter().map(|(from, _)| from.clone()))
            .collect()
    }

    /// An event is valid from `from` when some from-key is `from` or the wildcard.
    pub fn valid_state(&self, event: &str, from: Option<&S>) -> bool {
        self.find(event)
            .iter()
            .any(|transition| transition.matches(from))
    }

    /// More than one transition of `event` matches `from`.
    pub fn has_branch(&self, event: &str, from: Option<&S>) -> bool {
        self.find(event)
            .iter()
            .filter(|transition| transition.matches(from))
            .count()
            > 1
    }

    /// Resolve the transition `event` takes from `from`.
    ///
    /// Guards are evaluated only on a branch point; a single candidate is
    /// returned regardless of its guards.
    pub fn resolve(
        &self,
        event: &str,
        from: Option<&S>,
        target: &T,
        args: &[Value],
    ) -> Result<Resolution<S, T>, MachineError> {
        if self.has_branch(event, from) {
            return self.resolve_guarded(event, from, target, args);
        }
        Ok(self
            .find(event)
            .iter()
            .find(|transition| transition.matches(from))
            .map_or_else(
                || Resolution::Undefined(event.to_string()),
                |transition| Resolution::Defined(Arc::clone(transition)),
            ))
    }

    /// First matching transition whose guards all pass.
    pub fn resolve_guarded(
        &self,
        event: &str,
        from: Option<&S>,
        target: &T,
        args: &[Value],
    ) -> Result<Resolution<S, T>, MachineError> {
        for transition in self.find(event) {
            if transition.matches(from) && transition.check_conditions(target, args)? {
                return Ok(Resolution::Defined(Arc::clone(transition)));
            }
        }
        Ok(Resolution::Undefined(event.to_string()))
    }

    pub fn can_perform(
        &self,
        event: &str,
        from: Option<&S>,
        target: &T,
        args: &[Value],
    ) -> Result<bool, MachineError> {
        Ok(self.resolve_guarded(event, from, target, args)?.is_defined())
    }

    /// Event is silent when every transition registered for it is.
    pub fn is_silent(&self, event: &str) -> bool {
        let transitions = self.find(event);
        !transitions.is_empty() && transitions.iter().all(|transition| transition.is_silent())
    }

    pub fn event_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Concrete states in order of first appearance, sources before targets.
    pub fn states(&self) -> Vec<S> {
        let mut states: Vec<S> = Vec::new();
        for name in &self.order {
            for transition in self.find(name) {
                for (from, to) in transition.states() {
                    if let Source::State(state) = from {
                        if !states.contains(state) {
                            states.push(state.clone());
                        }
                    }
                    if !states.contains(to) {
                        states.push(to.clone());
                    }
                }
            }
        }
        states
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<S: State, T: Target> fmt::Display for TransitionRegistry<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.order {
            for transition in self.find(name) {
                writeln!(f, "{transition}")?;
            }
        }
        Ok(())
    }
}
