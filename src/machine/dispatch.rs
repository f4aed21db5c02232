//! Name -> operation table built from the registered events.

use crate::machine::error::MachineError;
use std::collections::HashMap;

/// Prefix selecting the asynchronous variant of an event.
pub const ASYNC_PREFIX: &str = "async.";

/// Suffix selecting the raising variant of an event.
pub const STRICT_SUFFIX: &str = "!";

/// Machine operations an event name may not shadow.
pub const RESERVED_NAMES: &[&str] = &[
    "async_trigger",
    "call",
    "can",
    "cannot",
    "current",
    "event_names",
    "handle",
    "initial_state",
    "inspect",
    "is",
    "is_any",
    "off",
    "on",
    "register_transition",
    "restore",
    "states",
    "subscribe",
    "target",
    "terminated",
    "transition",
    "transition_strict",
    "trigger",
    "trigger_strict",
    "trigger_with",
];

/// Fail with [`MachineError::AlreadyDefined`] for a reserved event name.
pub fn check_reserved(name: &str) -> Result<(), MachineError> {
    let clashes = RESERVED_NAMES.contains(&name)
        || name.ends_with(STRICT_SUFFIX)
        || name.starts_with(ASYNC_PREFIX);
    if clashes {
        return Err(MachineError::AlreadyDefined {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// What a dispatched name runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Trigger(String),
    TriggerStrict(String),
    AsyncTrigger(String),
}

#[derive(Debug, Default)]
pub struct DispatchTable {
    operations: HashMap<String, Operation>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table for `events`.
    pub fn refresh(&mut self, events: &[String]) {
        self.operations.clear();
        for event in events {
            self.operations
                .insert(event.clone(), Operation::Trigger(event.clone()));
            self.operations.insert(
                format!("{event}{STRICT_SUFFIX}"),
                Operation::TriggerStrict(event.clone()),
            );
            self.operations.insert(
                format!("{ASYNC_PREFIX}{event}"),
                Operation::AsyncTrigger(event.clone()),
            );
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Operation, MachineError> {
        self.operations
            .get(name)
            .cloned()
            .ok_or_else(|| MachineError::Unsupported {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DispatchTable {
        let mut table = DispatchTable::new();
        table.refresh(&["go".to_string(), "stop".to_string()]);
        table
    }

    #[test]
    fn each_event_gets_three_operations() {
        let table = table();
        assert_eq!(table.len(), 6);
        assert_eq!(table.lookup("go"), Ok(Operation::Trigger("go".to_string())));
        assert_eq!(
            table.lookup("stop!"),
            Ok(Operation::TriggerStrict("stop".to_string()))
        );
        assert_eq!(
            table.lookup("async.go"),
            Ok(Operation::AsyncTrigger("go".to_string()))
        );
    }

    #[test]
    fn unknown_names_are_unsupported() {
        assert_eq!(
            table().lookup("fly"),
            Err(MachineError::Unsupported {
                name: "fly".to_string()
            })
        );
    }

    #[test]
    fn refresh_drops_stale_entries() {
        let mut table = table();
        table.refresh(&["go".to_string()]);
        assert!(table.lookup("stop").is_err());
    }

    #[test]
    fn reserved_names_are_rejected() {
        assert!(check_reserved("go").is_ok());
        assert!(matches!(
            check_reserved("current"),
            Err(MachineError::AlreadyDefined { .. })
        ));
        assert!(check_reserved("go!").is_err());
        assert!(check_reserved("async.go").is_err());
    }
}
