//! The external object guards and callbacks act upon.
//!
//! A machine owns one target. Closure guards receive it directly; method and
//! expression guards go through the two lookup entry points below, which the
//! target implements for whichever names it supports.

use serde_json::Value;
use thiserror::Error;

/// Errors reported by a target while resolving a method or expression.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TargetError {
    #[error("undefined method '{0}' for target")]
    UndefinedMethod(String),

    #[error("target cannot evaluate expression '{0}'")]
    UnsupportedExpression(String),

    #[error("{0}")]
    Failed(String),
}

/// Object the machine drives.
///
/// Both methods default to an error, so a target only implements what its
/// definitions actually reference.
///
/// ```rust
/// use finite_machine::target::{Target, TargetError};
/// use serde_json::Value;
///
/// struct Engine {
///     fuel: u32,
/// }
///
/// impl Target for Engine {
///     fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value, TargetError> {
///         match name {
///             "has_fuel" => Ok(Value::Bool(self.fuel > 0)),
///             other => Err(TargetError::UndefinedMethod(other.to_string())),
///         }
///     }
/// }
/// ```
pub trait Target: Send + Sync + 'static {
    /// Invoke a named method with positional arguments.
    fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value, TargetError> {
        Err(TargetError::UndefinedMethod(name.to_string()))
    }

    /// Evaluate a free-form expression in the target's scope.
    fn evaluate(&self, expression: &str, _args: &[Value]) -> Result<Value, TargetError> {
        Err(TargetError::UnsupportedExpression(expression.to_string()))
    }
}

impl Target for () {}

/// Truthiness of a returned value: only `null` and `false` are false.
pub fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unit_target_has_no_methods() {
        let err = ().call_method("ready", &[]).unwrap_err();
        assert_eq!(err, TargetError::UndefinedMethod("ready".to_string()));
        assert!(().evaluate("a > b", &[]).is_err());
    }

    #[test]
    fn truthiness_follows_null_and_false() {
        assert!(!truthy(&Value::Null));
        assert!(!truthy(&json!(false)));
        assert!(truthy(&json!(0)));
        assert!(truthy(&json!("")));
        assert!(truthy(&json!({"ok": true})));
    }
}
