//! Builder for the transitions of one event.

use crate::core::{Guard, Source, State, Transition};
use crate::machine::MachineError;
use crate::target::Target;
use serde_json::Value;

/// Builder for constructing an event's from -> to mappings with a fluent API.
///
/// Sources given with `from*` are collected until the next `to`, so one
/// event can map several states at once:
///
/// ```
/// use finite_machine::builder::TransitionBuilder;
/// use finite_machine::state_enum;
///
/// state_enum! {
///     enum Phase {
///         Draft = "draft",
///         Review = "review",
///         Published = "published",
///     }
/// }
///
/// let transition = TransitionBuilder::<Phase, ()>::new()
///     .from(Phase::Draft)
///     .to(Phase::Review)
///     .from(Phase::Review)
///     .to(Phase::Published)
///     .build("advance")
///     .unwrap();
///
/// assert_eq!(transition.to_string(), "advance: draft -> review, review -> published");
/// ```
pub struct TransitionBuilder<S: State, T> {
    pending: Vec<Source<S>>,
    mappings: Vec<(Source<S>, S)>,
    guards: Vec<Guard<T>>,
    silent: bool,
}

impl<S: State, T: Target> TransitionBuilder<S, T> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            mappings: Vec::new(),
            guards: Vec::new(),
            silent: false,
        }
    }

    /// Add a source state.
    pub fn from(mut self, state: S) -> Self {
        self.pending.push(Source::State(state));
        self
    }

    pub fn from_states(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.pending.extend(states.into_iter().map(Source::State));
        self
    }

    /// Match every current state, `none` included.
    pub fn from_any(mut self) -> Self {
        self.pending.push(Source::Any);
        self
    }

    pub fn from_none(mut self) -> Self {
        self.pending.push(Source::None);
        self
    }

    /// Map the pending sources to `state`. Without sources, maps the wildcard.
    pub fn to(mut self, state: S) -> Self {
        if self.pending.is_empty() {
            self.pending.push(Source::Any);
        }
        for source in self.pending.drain(..) {
            self.mappings.push((source, state.clone()));
        }
        self
    }

    /// Add a guard (optional). Every guard must pass.
    pub fn guard(mut self, guard: Guard<T>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&T, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    pub fn unless<F>(self, predicate: F) -> Self
    where
        F: Fn(&T, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::unless(predicate))
    }

    /// Guard on a named target method.
    pub fn if_method(self, name: impl Into<String>) -> Self {
        self.guard(Guard::method(name))
    }

    pub fn unless_method(self, name: impl Into<String>) -> Self {
        self.guard(Guard::method(name).negate())
    }

    /// Guard on an expression the target evaluates.
    pub fn if_expr(self, expression: impl Into<String>) -> Self {
        self.guard(Guard::expression(expression))
    }

    pub fn unless_expr(self, expression: impl Into<String>) -> Self {
        self.guard(Guard::expression(expression).negate())
    }

    /// Skip callbacks when the event runs.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Build the transition for `event`.
    ///
    /// Fails when no mapping was declared or a source was left without a
    /// target.
    pub fn build(self, event: &str) -> Result<Transition<S, T>, MachineError> {
        if !self.pending.is_empty() {
            return Err(MachineError::NotEnoughTransitions {
                event: event.to_string(),
            });
        }
        Ok(Transition::new(event, self.mappings, self.guards)?.silent(self.silent))
    }
}

impl<S: State, T: Target> Default for TransitionBuilder<S, T> {
    fn default() -> Self {
        Self::new()
    }
}
