//! Per-machine error handlers consulted before an error reaches the caller.

use crate::machine::error::{ErrorKind, MachineError};
use crate::target::Target;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// Which errors a handler accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorSelector {
    /// Every machine error.
    Any,
    Kind(ErrorKind),
    /// A class name anywhere in the error's lineage.
    Named(String),
}

impl ErrorSelector {
    pub fn matches(&self, error: &MachineError) -> bool {
        match self {
            Self::Any => true,
            Self::Kind(kind) => error.kind() == *kind,
            Self::Named(name) => error.lineage().contains(&name.as_str()),
        }
    }
}

impl From<ErrorKind> for ErrorSelector {
    fn from(kind: ErrorKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<&str> for ErrorSelector {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ErrorSelector {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

type HandlerFn<T> = Arc<dyn Fn(&T, &MachineError) + Send + Sync>;

/// What runs when a selector matches.
pub enum ErrorHandler<T> {
    Closure(HandlerFn<T>),
    /// Target method called with `[class_name, message]`.
    Method(String),
}

impl<T> Clone for ErrorHandler<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Closure(f) => Self::Closure(Arc::clone(f)),
            Self::Method(name) => Self::Method(name.clone()),
        }
    }
}

impl<T> fmt::Debug for ErrorHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure(_) => f.write_str("Closure(<fn>)"),
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
        }
    }
}

impl<T: Target> ErrorHandler<T> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&T, &MachineError) + Send + Sync + 'static,
    {
        Self::Closure(Arc::new(handler))
    }

    /// Handler that does not look at the error.
    pub fn ignoring<F>(handler: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::Closure(Arc::new(move |target, _| handler(target)))
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }

    /// Run the handler. A failing method handler leaves the error unhandled.
    pub fn invoke(&self, target: &T, error: &MachineError) -> Result<(), String> {
        match self {
            Self::Closure(f) => {
                f(target, error);
                Ok(())
            }
            Self::Method(name) => {
                let args: [Value; 2] = [json!(error.class_name()), json!(error.to_string())];
                target
                    .call_method(name, &args)
                    .map(|_| ())
                    .map_err(|err| err.to_string())
            }
        }
    }
}

/// Handlers in registration order; the most recent match wins.
pub struct CatchRegistry<T> {
    handlers: Vec<(ErrorSelector, ErrorHandler<T>)>,
}

impl<T: Target> Default for CatchRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Target> CatchRegistry<T> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn register(&mut self, selector: ErrorSelector, handler: ErrorHandler<T>) {
        self.handlers.push((selector, handler));
    }

    pub fn find(&self, error: &MachineError) -> Option<ErrorHandler<T>> {
        self.handlers
            .iter()
            .rev()
            .find(|(selector, _)| selector.matches(error))
            .map(|(_, handler)| handler.clone())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
