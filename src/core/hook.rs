//! Hook kinds and the value objects built each time hooks fire.

use crate::core::state::{state_name, State};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle point a callback is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookKind {
    Before,
    Exit,
    Transition,
    Enter,
    After,
}

impl HookKind {
    pub const ALL: [HookKind; 5] = [
        HookKind::Before,
        HookKind::Exit,
        HookKind::Transition,
        HookKind::Enter,
        HookKind::After,
    ];

    /// Hooks keyed by a state name (as opposed to an event name).
    pub fn is_state_hook(&self) -> bool {
        matches!(self, Self::Exit | Self::Transition | Self::Enter)
    }

    pub fn is_event_hook(&self) -> bool {
        !self.is_state_hook()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Exit => "exit",
            Self::Transition => "transition",
            Self::Enter => "enter",
            Self::After => "after",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One firing of a hook kind.
///
/// `name` is what callbacks are looked up by: the event name for
/// before/after hooks, the state left for exit hooks, and the state now
/// current for transition/enter hooks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct HookEvent<S: State> {
    pub kind: HookKind,
    pub name: String,
    pub event_name: String,
    pub from: Option<S>,
}

impl<S: State> HookEvent<S> {
    pub fn build(kind: HookKind, current: Option<&S>, event_name: &str, from: Option<&S>) -> Self {
        let name = match kind {
            HookKind::Before | HookKind::After => event_name.to_string(),
            HookKind::Exit => state_name(from).to_string(),
            HookKind::Transition | HookKind::Enter => state_name(current).to_string(),
        };
        Self {
            kind,
            name,
            event_name: event_name.to_string(),
            from: from.cloned(),
        }
    }
}

/// What a callback body is told about the transition in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionEvent<S: State> {
    pub name: String,
    pub from: Option<S>,
    pub to: Option<S>,
}

impl<S: State> TransitionEvent<S> {
    /// True when the transition leaves the state unchanged.
    pub fn is_loop(&self) -> bool {
        self.from == self.to
    }
}

impl<S: State> fmt::Display for TransitionEvent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.name,
            state_name(self.from.as_ref()),
            state_name(self.to.as_ref())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::NONE;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Light {
        Green,
        Red,
    }

    impl State for Light {
        fn name(&self) -> &str {
            match self {
                Self::Green => "green",
                Self::Red => "red",
            }
        }
    }

    #[test]
    fn event_hooks_are_named_after_event() {
        let green = Some(&Light::Green);
        let hook = HookEvent::build(HookKind::Before, green, "go", green);
        assert_eq!(hook.name, "go");
        assert_eq!(hook.event_name, "go");
    }

    #[test]
    fn exit_is_named_after_source_and_enter_after_current() {
        let exit = HookEvent::build(HookKind::Exit, Some(&Light::Green), "go", Some(&Light::Green));
        assert_eq!(exit.name, "green");

        let enter = HookEvent::build(HookKind::Enter, Some(&Light::Red), "go", Some(&Light::Green));
        assert_eq!(enter.name, "red");
        assert_eq!(enter.from, Some(Light::Green));
    }

    #[test]
    fn initial_exit_is_named_none() {
        let exit = HookEvent::<Light>::build(HookKind::Exit, None, "init", None);
        assert_eq!(exit.name, NONE);
    }

    #[test]
    fn hook_kinds_split_into_state_and_event_hooks() {
        let state_hooks: Vec<_> = HookKind::ALL.iter().filter(|k| k.is_state_hook()).collect();
        assert_eq!(
            state_hooks,
            vec![&HookKind::Exit, &HookKind::Transition, &HookKind::Enter]
        );
        assert!(HookKind::Before.is_event_hook());
    }

    #[test]
    fn transition_event_displays_states() {
        let event = TransitionEvent {
            name: "go".to_string(),
            from: Some(Light::Green),
            to: Some(Light::Red),
        };
        assert_eq!(event.to_string(), "go: green -> red");
        assert!(!event.is_loop());
    }
}
