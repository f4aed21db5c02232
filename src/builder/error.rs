//! Build errors for the machine builder.

use crate::machine::MachineError;
use thiserror::Error;

/// Every problem found in a machine definition.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid machine definition: {}", summarize(.errors))]
pub struct BuildError {
    pub errors: Vec<MachineError>,
}

fn summarize(errors: &[MachineError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl BuildError {
    pub fn new(errors: Vec<MachineError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[MachineError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<MachineError> for BuildError {
    fn from(error: MachineError) -> Self {
        Self::new(vec![error])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_every_error() {
        let err = BuildError::new(vec![
            MachineError::MissingInitialState,
            MachineError::AlreadyDefined {
                name: "current".to_string(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("Initial state not specified"));
        assert!(message.contains("'current' is already defined"));
        assert_eq!(err.len(), 2);
    }
}
