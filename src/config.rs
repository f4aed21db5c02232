//! Machine-wide settings.

use serde::{Deserialize, Serialize};

/// Order in which wildcard and named callbacks of one hook kind run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookOrder {
    /// `on_enter("red")` before `on_enter(ANY)`.
    #[default]
    SpecificFirst,
    /// `on_enter(ANY)` before `on_enter("red")`.
    GenericFirst,
}

/// Settings shared by every operation of one machine.
///
/// ```rust
/// use finite_machine::config::{HookOrder, MachineConfig};
///
/// let config = MachineConfig::from_json(r#"{ "log_transitions": true }"#).unwrap();
/// assert!(config.log_transitions);
/// assert_eq!(config.hook_order, HookOrder::SpecificFirst);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Report each committed transition at info level.
    pub log_transitions: bool,
    pub hook_order: HookOrder,
    /// Reject event names that shadow machine operations.
    pub reserved_names_check: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            log_transitions: false,
            hook_order: HookOrder::default(),
            reserved_names_check: true,
        }
    }
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// How the initial state is entered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialOptions {
    /// Event registered for the `none -> initial` transition.
    pub event: String,
    /// Leave the machine in `none` until the event is triggered by hand.
    pub defer: bool,
    /// Skip callbacks when entering the initial state.
    pub silent: bool,
}

impl Default for InitialOptions {
    fn default() -> Self {
        Self {
            event: "init".to_string(),
            defer: false,
            silent: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_quiet() {
        let config = MachineConfig::default();
        assert!(!config.log_transitions);
        assert!(config.reserved_names_check);
        assert_eq!(config.hook_order, HookOrder::SpecificFirst);
    }

    #[test]
    fn hook_order_parses_snake_case() {
        let config = MachineConfig::from_json(r#"{ "hook_order": "generic_first" }"#).unwrap();
        assert_eq!(config.hook_order, HookOrder::GenericFirst);
    }

    #[test]
    fn unknown_hook_order_is_rejected() {
        assert!(MachineConfig::from_json(r#"{ "hook_order": "random" }"#).is_err());
    }

    #[test]
    fn initial_options_default_to_silent_init() {
        let options = InitialOptions::default();
        assert_eq!(options.event, "init");
        assert!(options.silent);
        assert!(!options.defer);
    }
}
