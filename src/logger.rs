//! Logging sink injected into each machine.

use crate::core::{state_name, State};
use serde_json::Value;

/// Sink for machine diagnostics.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `finite_machine` target.
///
/// Without an installed subscriber every call is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "finite_machine", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "finite_machine", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "finite_machine", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "finite_machine", "{message}");
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Line reported for a committed transition.
pub fn format_transition<S: State>(
    event: &str,
    from: Option<&S>,
    to: Option<&S>,
    args: &[Value],
) -> String {
    let mut line = format!(
        "Transition: @event={} {} -> {}",
        event,
        state_name(from),
        state_name(to)
    );
    if !args.is_empty() {
        let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
        line.push_str(&format!(" with [{}]", rendered.join(", ")));
    }
    line
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Logger;
    use parking_lot::Mutex;

    /// Logger that keeps every line, prefixed by its level.
    #[derive(Default)]
    pub struct RecordingLogger {
        pub lines: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }

        fn push(&self, level: &str, message: &str) {
            self.lines.lock().push(format!("{level}: {message}"));
        }
    }

    impl Logger for RecordingLogger {
        fn debug(&self, message: &str) {
            self.push("debug", message);
        }
        fn info(&self, message: &str) {
            self.push("info", message);
        }
        fn warn(&self, message: &str) {
            self.push("warn", message);
        }
        fn error(&self, message: &str) {
            self.push("error", message);
        }
    }
}
