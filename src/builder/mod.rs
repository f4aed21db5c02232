//! Builder API for ergonomic state machine construction.
//!
//! This module provides fluent builders and macros for declaring states,
//! events, choices and callbacks. Everything the builders declare goes
//! through the same registration entry points a built machine exposes.

pub mod choice;
pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use choice::ChoiceBuilder;
pub use error::BuildError;
pub use machine::MachineBuilder;
pub use transition::TransitionBuilder;

use crate::core::State;
use crate::target::Target;
use serde_json::Value;

/// Create an unconditional `from -> to` transition builder.
///
/// # Example
///
/// ```
/// use finite_machine::builder::simple_transition;
/// use finite_machine::state_enum;
///
/// state_enum! {
///     enum MyState {
///         Start,
///         End,
///     }
///     final: [End]
/// }
///
/// let transition = simple_transition::<MyState, ()>(MyState::Start, MyState::End)
///     .build("finish")
///     .unwrap();
/// assert!(transition.matches(Some(&MyState::Start)));
/// ```
pub fn simple_transition<S, T>(from: S, to: S) -> TransitionBuilder<S, T>
where
    S: State,
    T: Target,
{
    TransitionBuilder::new().from(from).to(to)
}

/// Create a `from -> to` transition builder with a guard predicate.
///
/// # Example
///
/// ```
/// use finite_machine::builder::guarded_transition;
/// use finite_machine::state_enum;
/// use serde_json::json;
///
/// state_enum! {
///     enum MyState {
///         Start,
///         Middle,
///     }
/// }
///
/// let transition = guarded_transition::<MyState, (), _>(
///     MyState::Start,
///     MyState::Middle,
///     |_, args| !args.is_empty(),
/// )
/// .build("advance")
/// .unwrap();
/// assert!(transition.check_conditions(&(), &[json!(1)]).unwrap());
/// ```
pub fn guarded_transition<S, T, F>(from: S, to: S, guard: F) -> TransitionBuilder<S, T>
where
    S: State,
    T: Target,
    F: Fn(&T, &[Value]) -> bool + Send + Sync + 'static,
{
    TransitionBuilder::new().from(from).to(to).when(guard)
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

        fn is_final(&self) -> bool {
            matches!(self, Self::End)
        }
    }

    #[test]
    fn simple_transition_builds() {
        let transition = simple_transition::<TestState, ()>(TestState::Start, TestState::Middle)
            .build("advance")
            .unwrap();

        assert_eq!(
            transition.to_state(Some(&TestState::Start)),
            Some(TestState::Middle)
        );
        assert!(!transition.matches(Some(&TestState::End)));
    }

    #[test]
    fn guarded_transition_respects_guard() {
        let transition = guarded_transition::<TestState, (), _>(
            TestState::Middle,
            TestState::End,
            |_, args| args.len() == 2,
        )
        .build("finish")
        .unwrap();

        assert!(transition.check_conditions(&(), &[Value::Null, Value::Null]).unwrap());
        assert!(!transition.check_conditions(&(), &[]).unwrap());
    }
}
