//! Transition records registered under an event name.

use crate::core::guard::Guard;
use crate::core::state::{Source, State};
use crate::machine::MachineError;
use crate::target::Target;
use serde_json::Value;
use std::fmt;

/// A from -> to mapping for one event, with its guards.
///
/// Records are immutable once registered and shared between callers.
pub struct Transition<S: State, T> {
    name: String,
    states: Vec<(Source<S>, S)>,
    conditions: Vec<Guard<T>>,
    silent: bool,
}

impl<S: State, T: Target> Transition<S, T> {
    /// Create a transition. Fails when `states` is empty.
    pub fn new(
        name: impl Into<String>,
        states: Vec<(Source<S>, S)>,
        conditions: Vec<Guard<T>>,
    ) -> Result<Self, MachineError> {
        let name = name.into();
        if states.is_empty() {
            return Err(MachineError::NotEnoughTransitions { event: name });
        }
        Ok(Self {
            name,
            states,
            conditions,
            silent: false,
        })
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &[(Source<S>, S)] {
        &self.states
    }

    pub fn conditions(&self) -> &[Guard<T>] {
        &self.conditions
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// True when the map has `from` or the wildcard as a key.
    pub fn matches(&self, from: Option<&S>) -> bool {
        self.states.iter().any(|(source, _)| source.accepts(from))
    }

    /// All guards pass for the given target and arguments.
    pub fn check_conditions(&self, target: &T, args: &[Value]) -> Result<bool, MachineError> {
        for guard in &self.conditions {
            if !guard.check(target, args)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// State reached from `from`.
    ///
    /// An exact key wins over the wildcard, and an unmapped `from` is
    /// returned unchanged.
    pub fn to_state(&self, from: Option<&S>) -> Option<S> {
        self.states
            .iter()
            .find(|(source, _)| source.is(from))
            .or_else(|| self.states.iter().find(|(source, _)| source.is_any()))
            .map(|(_, to)| to.clone())
            .or_else(|| from.cloned())
    }
}

impl<S: State, T> fmt::Debug for Transition<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("states", &self.states)
            .field("conditions", &self.conditions.len())
            .field("silent", &self.silent)
            .finish()
    }
}

impl<S: State, T> fmt::Display for Transition<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mappings: Vec<String> = self
            .states
            .iter()
            .map(|(from, to)| format!("{} -> {}", from, to.name()))
            .collect();
        write!(f, "{}: {}", self.name, mappings.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Start,
        Middle,
        End,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Start => "start",
                Self::Middle => "middle",
                Self::End => "end",
            }
        }
    }

    fn advance() -> Transition<TestState, ()> {
        Transition::new(
            "advance",
            vec![
                (Source::from(TestState::Start), TestState::Middle),
                (Source::Any, TestState::End),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn empty_mapping_is_rejected() {
        let result = Transition::<TestState, ()>::new("noop", Vec::new(), Vec::new());
        assert!(matches!(
            result,
            Err(MachineError::NotEnoughTransitions { event }) if event == "noop"
        ));
    }

    #[test]
    fn exact_key_wins_over_wildcard() {
        let transition = advance();
        assert_eq!(
            transition.to_state(Some(&TestState::Start)),
            Some(TestState::Middle)
        );
        assert_eq!(
            transition.to_state(Some(&TestState::Middle)),
            Some(TestState::End)
        );
        assert_eq!(transition.to_state(None), Some(TestState::End));
    }

    #[test]
    fn unmapped_source_is_identity() {
        let transition: Transition<TestState, ()> = Transition::new(
            "finish",
            vec![(Source::from(TestState::Middle), TestState::End)],
            Vec::new(),
        )
        .unwrap();

        assert!(!transition.matches(Some(&TestState::Start)));
        assert_eq!(
            transition.to_state(Some(&TestState::Start)),
            Some(TestState::Start)
        );
    }

    #[test]
    fn conditions_must_all_pass() {
        let transition: Transition<TestState, ()> = Transition::new(
            "advance",
            vec![(Source::from(TestState::Start), TestState::Middle)],
            vec![Guard::new(|_, _| true), Guard::new(|_, _| false)],
        )
        .unwrap();

        assert!(!transition.check_conditions(&(), &[]).unwrap());
    }

    #[test]
    fn display_lists_mappings() {
        assert_eq!(advance().to_string(), "advance: start -> middle, any -> end");
    }
}
