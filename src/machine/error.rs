//! Errors raised by machine definition, triggering and dispatch.

use crate::queue::QueueError;
use thiserror::Error;

/// Root class name shared by every machine error.
pub const ROOT_CLASS: &str = "MachineError";

/// Errors that can occur while defining or running a state machine
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    #[error("inappropriate current state '{state}' for event '{event}'")]
    InvalidState { event: String, state: String },

    #[error("transition '{event}' from '{from}' to '{to}' failed: {message}")]
    Transition {
        event: String,
        from: String,
        to: String,
        message: String,
    },

    #[error("event '{event}' declares no from -> to mappings")]
    NotEnoughTransitions { event: String },

    #[error("{reason}: '{name}' cannot be used for {kind} callbacks")]
    InvalidCallbackName {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("'{name}' is already defined by the machine")]
    AlreadyDefined { name: String },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("event cancelled: {message}")]
    Callback { message: String },

    #[error("condition failed to evaluate: {message}")]
    Condition { message: String },

    #[error("unsupported operation '{name}'")]
    Unsupported { name: String },

    #[error("{class}: {message}")]
    Raised {
        class: String,
        ancestors: Vec<String>,
        message: String,
    },
}

/// Classification used by the catch registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidState,
    Transition,
    NotEnoughTransitions,
    InvalidCallbackName,
    MissingInitialState,
    AlreadyDefined,
    QueueDead,
    Callback,
    Condition,
    Unsupported,
    Raised,
}

impl ErrorKind {
    /// Class name used when selecting handlers by name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidState => "InvalidStateError",
            Self::Transition => "TransitionError",
            Self::NotEnoughTransitions => "NotEnoughTransitionsError",
            Self::InvalidCallbackName => "InvalidCallbackNameError",
            Self::MissingInitialState => "MissingInitialStateError",
            Self::AlreadyDefined => "AlreadyDefinedError",
            Self::QueueDead => "QueueDeadError",
            Self::Callback => "CallbackError",
            Self::Condition => "ConditionError",
            Self::Unsupported => "UnsupportedOperationError",
            Self::Raised => "RaisedError",
        }
    }
}

impl MachineError {
    /// Build a user error carrying its own class name.
    ///
    /// ```rust
    /// use finite_machine::MachineError;
    ///
    /// let err = MachineError::raised("PaymentDeclined", "card expired")
    ///     .with_ancestor("PaymentError");
    /// assert_eq!(err.class_name(), "PaymentDeclined");
    /// assert!(err.lineage().contains(&"PaymentError"));
    /// ```
    pub fn raised(class: impl Into<String>, message: impl Into<String>) -> Self {
        MachineError::Raised {
            class: class.into(),
            ancestors: Vec::new(),
            message: message.into(),
        }
    }

    /// Declare a parent class for a raised error. Other variants are unchanged.
    pub fn with_ancestor(mut self, ancestor: impl Into<String>) -> Self {
        if let MachineError::Raised { ancestors, .. } = &mut self {
            ancestors.push(ancestor.into());
        }
        self
    }

    /// The error raised by [`HookContext::cancel_event`].
    ///
    /// [`HookContext::cancel_event`]: crate::observer::HookContext::cancel_event
    pub fn cancel_event(message: impl Into<String>) -> Self {
        MachineError::Callback {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Transition { .. } => ErrorKind::Transition,
            Self::NotEnoughTransitions { .. } => ErrorKind::NotEnoughTransitions,
            Self::InvalidCallbackName { .. } => ErrorKind::InvalidCallbackName,
            Self::MissingInitialState => ErrorKind::MissingInitialState,
            Self::AlreadyDefined { .. } => ErrorKind::AlreadyDefined,
            Self::Queue(_) => ErrorKind::QueueDead,
            Self::Callback { .. } => ErrorKind::Callback,
            Self::Condition { .. } => ErrorKind::Condition,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Raised { .. } => ErrorKind::Raised,
        }
    }

    /// Most specific class name of this error.
    pub fn class_name(&self) -> &str {
        match self {
            Self::Raised { class, .. } => class,
            other => other.kind().name(),
        }
    }

    /// Class names from most specific to [`ROOT_CLASS`].
    pub fn lineage(&self) -> Vec<&str> {
        let mut lineage = vec![self.class_name()];
        if let Self::Raised { ancestors, .. } = self {
            lineage.extend(ancestors.iter().map(String::as_str));
        }
        lineage.push(ROOT_CLASS);
        lineage
    }

    /// Errors the non-raising trigger API converts into `false`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidState | ErrorKind::Transition
        )
    }
}
