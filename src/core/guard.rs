//! Guard predicates for controlling state transitions.
//!
//! Guards decide whether a transition is eligible. A guard wraps one of the
//! three condition shapes (closure, target method, expression) and an
//! optional negation for `unless` guards.

use crate::machine::MachineError;
use crate::target::{truthy, Target};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Closure form of a condition.
pub type Predicate<T> = Arc<dyn Fn(&T, &[Value]) -> bool + Send + Sync>;

/// The callable behind a guard.
pub enum Condition<T> {
    /// Closure evaluated against the target and the trigger arguments.
    Closure(Predicate<T>),
    /// Name of a target method; its return value is tested for truthiness.
    Method(String),
    /// Expression string handed to [`Target::evaluate`].
    Expression(String),
}

impl<T> Clone for Condition<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Closure(predicate) => Self::Closure(Arc::clone(predicate)),
            Self::Method(name) => Self::Method(name.clone()),
            Self::Expression(expr) => Self::Expression(expr.clone()),
        }
    }
}

impl<T> fmt::Debug for Condition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure(_) => f.write_str("Closure(..)"),
            Self::Method(name) => write!(f, "Method({name})"),
            Self::Expression(expr) => write!(f, "Expression({expr})"),
        }
    }
}

/// Predicate that determines if a transition can execute.
///
/// # Example
///
/// ```rust
/// use finite_machine::core::Guard;
/// use serde_json::json;
///
/// let positive = Guard::<()>::new(|_, args| args.first().and_then(|v| v.as_i64()) > Some(0));
///
/// assert!(positive.check(&(), &[json!(3)]).unwrap());
/// assert!(!positive.check(&(), &[json!(-1)]).unwrap());
/// assert!(!positive.negate().check(&(), &[json!(3)]).unwrap());
/// ```
pub struct Guard<T> {
    condition: Condition<T>,
    negated: bool,
}

impl<T> Clone for Guard<T> {
    fn clone(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            negated: self.negated,
        }
    }
}

impl<T> fmt::Debug for Guard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("condition", &self.condition)
            .field("negated", &self.negated)
            .finish()
    }
}

impl<T: Target> Guard<T> {
    /// Create an `if` guard from a closure.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self::from_condition(Condition::Closure(Arc::new(predicate)))
    }

    /// Create an `unless` guard from a closure.
    pub fn unless<F>(predicate: F) -> Self
    where
        F: Fn(&T, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self::new(predicate).negate()
    }

    /// Guard calling a named target method.
    pub fn method(name: impl Into<String>) -> Self {
        Self::from_condition(Condition::Method(name.into()))
    }

    /// Guard evaluating an expression against the target.
    pub fn expression(expression: impl Into<String>) -> Self {
        Self::from_condition(Condition::Expression(expression.into()))
    }

    pub fn from_condition(condition: Condition<T>) -> Self {
        Guard {
            condition,
            negated: false,
        }
    }

    /// Turn an `if` guard into an `unless` guard and back.
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn condition(&self) -> &Condition<T> {
        &self.condition
    }

    /// Check if the guard allows the transition.
    ///
    /// Method and expression lookups that the target rejects fail with
    /// [`MachineError::Condition`].
    pub fn check(&self, target: &T, args: &[Value]) -> Result<bool, MachineError> {
        let passed = match &self.condition {
            Condition::Closure(predicate) => predicate(target, args),
            Condition::Method(name) => target
                .call_method(name, args)
                .map(|value| truthy(&value))
                .map_err(|err| MachineError::Condition {
                    message: err.to_string(),
                })?,
            Condition::Expression(expr) => target
                .evaluate(expr, args)
                .map(|value| truthy(&value))
                .map_err(|err| MachineError::Condition {
                    message: err.to_string(),
                })?,
        };
        Ok(passed != self.negated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetError;
    use serde_json::json;

    struct Account {
        balance: i64,
    }

    impl Target for Account {
        fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, TargetError> {
            match name {
                "funded" => Ok(json!(self.balance > 0)),
                "covers" => {
                    let amount = args.first().and_then(Value::as_i64).unwrap_or(0);
                    Ok(json!(self.balance >= amount))
                }
                other => Err(TargetError::UndefinedMethod(other.to_string())),
            }
        }

        fn evaluate(&self, expression: &str, _args: &[Value]) -> Result<Value, TargetError> {
            match expression {
                "balance == 0" => Ok(json!(self.balance == 0)),
                other => Err(TargetError::UnsupportedExpression(other.to_string())),
            }
        }
    }

    #[test]
    fn closure_guard_sees_target_and_args() {
        let guard = Guard::new(|account: &Account, args: &[Value]| {
            account.balance > args[0].as_i64().unwrap_or(0)
        });
        let account = Account { balance: 10 };

        assert!(guard.check(&account, &[json!(5)]).unwrap());
        assert!(!guard.check(&account, &[json!(50)]).unwrap());
    }

    #[test]
    fn unless_guard_inverts_predicate() {
        let guard = Guard::unless(|account: &Account, _: &[Value]| account.balance > 0);

        assert!(guard.is_negated());
        assert!(!guard.check(&Account { balance: 1 }, &[]).unwrap());
        assert!(guard.check(&Account { balance: 0 }, &[]).unwrap());
    }

    #[test]
    fn method_guard_calls_target() {
        let guard = Guard::<Account>::method("covers");
        let account = Account { balance: 20 };

        assert!(guard.check(&account, &[json!(20)]).unwrap());
        assert!(!guard.check(&account, &[json!(21)]).unwrap());
    }

    #[test]
    fn expression_guard_uses_evaluate() {
        let guard = Guard::<Account>::expression("balance == 0");
        assert!(guard.check(&Account { balance: 0 }, &[]).unwrap());
        assert!(!guard.check(&Account { balance: 3 }, &[]).unwrap());
    }

    #[test]
    fn unknown_method_is_condition_error() {
        let guard = Guard::<Account>::method("missing");
        let err = guard.check(&Account { balance: 1 }, &[]).unwrap_err();
        assert!(matches!(err, MachineError::Condition { .. }));
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::<Account>::method("funded");
        let account = Account { balance: 4 };
        assert_eq!(
            guard.check(&account, &[]).unwrap(),
            guard.check(&account, &[]).unwrap()
        );
    }
}
