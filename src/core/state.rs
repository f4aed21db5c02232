//! Core State trait and the from-key used by transition maps.
//!
//! A machine's current value is `Option<S>`: `None` is the state held before
//! the initial transition, printed as [`NONE`].

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Name used for the state a machine holds before its initial transition.
pub const NONE: &str = "none";

/// Wildcard name matching every state (for hooks) or every event.
pub const ANY: &str = "any";

/// Trait for state machine states.
///
/// # Required Traits
///
/// - `Clone`: States are copied into transition events and queued callbacks
/// - `PartialEq`: States must be comparable for transition lookup
/// - `Debug`: States must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: Hook events are serializable for subscribers
///
/// # Example
///
/// ```rust
/// use finite_machine::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Light {
///     Green,
///     Yellow,
///     Red,
/// }
///
/// impl State for Light {
///     fn name(&self) -> &str {
///         match self {
///             Self::Green => "green",
///             Self::Yellow => "yellow",
///             Self::Red => "red",
///         }
///     }
/// }
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name.
    ///
    /// Names identify states when hooks are registered, so they must be
    /// unique within a machine.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Machines also accept terminal states declared at definition time;
    /// either source marks the machine as terminated.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

/// Display name of an optional current state.
pub fn state_name<S: State>(state: Option<&S>) -> &str {
    state.map_or(NONE, |s| s.name())
}

/// Key on the from side of a transition map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Source<S: State> {
    /// The machine has not entered any state yet.
    None,
    /// Matches every current state, including `None`.
    Any,
    /// A concrete state.
    State(S),
}

impl<S: State> Source<S> {
    /// Key for the given current state.
    pub fn of(current: Option<&S>) -> Self {
        match current {
            Some(state) => Source::State(state.clone()),
            None => Source::None,
        }
    }

    /// True when this key names exactly `current` (wildcard excluded).
    pub fn is(&self, current: Option<&S>) -> bool {
        match (self, current) {
            (Source::None, None) => true,
            (Source::State(own), Some(other)) => own == other,
            _ => false,
        }
    }

    /// True when this key accepts `current`, wildcard included.
    pub fn accepts(&self, current: Option<&S>) -> bool {
        matches!(self, Source::Any) || self.is(current)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Source::Any)
    }

    pub fn name(&self) -> &str {
        match self {
            Source::None => NONE,
            Source::Any => ANY,
            Source::State(state) => state.name(),
        }
    }
}

impl<S: State> From<S> for Source<S> {
    fn from(state: S) -> Self {
        Source::State(state)
    }
}

impl<S: State> fmt::Display for Source<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Initial,
        Processing,
        Complete,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Initial => "initial",
                Self::Processing => "processing",
                Self::Complete => "complete",
            }
        }

        fn is_final(&self) -> bool {
            matches!(self, Self::Complete)
        }
    }

    #[test]
    fn state_name_returns_correct_value() {
        assert_eq!(TestState::Initial.name(), "initial");
        assert_eq!(TestState::Processing.name(), "processing");
        assert_eq!(state_name(Some(&TestState::Complete)), "complete");
        assert_eq!(state_name::<TestState>(None), NONE);
    }

    #[test]
    fn is_final_identifies_terminal_states() {
        assert!(!TestState::Initial.is_final());
        assert!(!TestState::Processing.is_final());
        assert!(TestState::Complete.is_final());
    }

    #[test]
    fn source_any_accepts_everything() {
        let any = Source::<TestState>::Any;
        assert!(any.accepts(None));
        assert!(any.accepts(Some(&TestState::Initial)));
        assert!(!any.is(Some(&TestState::Initial)));
    }

    #[test]
    fn source_matches_exact_state() {
        let source = Source::from(TestState::Initial);
        assert!(source.is(Some(&TestState::Initial)));
        assert!(!source.accepts(Some(&TestState::Processing)));
        assert!(!source.accepts(None));
        assert!(Source::<TestState>::None.is(None));
    }

    #[test]
    fn source_serializes_correctly() {
        let source = Source::from(TestState::Processing);
        let json = serde_json::to_string(&source).unwrap();
        let deserialized: Source<TestState> = serde_json::from_str(&json).unwrap();
        assert_eq!(source, deserialized);
    }
}
