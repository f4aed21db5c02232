//! The trigger algorithm and hook notification.

use crate::config::HookOrder;
use crate::core::{state_name, HookEvent, HookKind, State, TransitionEvent, ANY};
use crate::logger::format_transition;
use crate::machine::error::{ErrorKind, MachineError};
use crate::machine::StateMachine;
use crate::observer::{Callback, CallbackKind, HookContext, Outcome};
use crate::queue::{DispatchQueue, QueueError, Task};
use crate::target::Target;
use serde_json::Value;
use std::cell::Cell;
use std::sync::Arc;

/// Block run right before the state write, given `from` and `to`.
pub type CommitBlock<'a, S> =
    Box<dyn FnOnce(Option<&S>, Option<&S>) -> anyhow::Result<()> + 'a>;

/// Safe variants report invalid-state and transition failures as `false`.
fn recover(result: Result<bool, MachineError>) -> Result<bool, MachineError> {
    match result {
        Err(err) if err.is_recoverable() => Ok(false),
        other => other,
    }
}

/// Start `queue` on first use. A dead queue is left as is; it logs and drops
/// whatever it is sent.
fn ensure_started(queue: &DispatchQueue) -> Result<(), MachineError> {
    match queue.start() {
        Ok(()) | Err(QueueError::Dead { .. }) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

impl<S: State, T: Target> StateMachine<S, T> {
    /// Fire `event`. Returns whether the attempt got past the validity and
    /// guard checks.
    ///
    /// Invalid-state and transition failures become `Ok(false)`; every other
    /// error still propagates.
    pub fn trigger(&self, event: &str, args: &[Value]) -> Result<bool, MachineError> {
        recover(self.trigger_strict(event, args))
    }

    /// Fire `event`, surfacing every failure no error handler accepts.
    ///
    /// Any error rolls the machine back to the state it had before the call.
    pub fn trigger_strict(&self, event: &str, args: &[Value]) -> Result<bool, MachineError> {
        self.run(event, args, None)
    }

    /// Strict trigger running `block` just before the new state is written.
    ///
    /// A failing block aborts the change with [`MachineError::Transition`].
    pub fn trigger_with<F>(
        &self,
        event: &str,
        args: &[Value],
        block: F,
    ) -> Result<bool, MachineError>
    where
        F: FnOnce(Option<&S>, Option<&S>) -> anyhow::Result<()>,
    {
        self.run(event, args, Some(Box::new(block)))
    }

    /// Move through `event` without firing callbacks.
    pub fn transition(&self, event: &str, args: &[Value]) -> Result<bool, MachineError> {
        recover(self.transition_strict(event, args))
    }

    pub fn transition_strict(&self, event: &str, args: &[Value]) -> Result<bool, MachineError> {
        self.attempt(event, args, true, None)
    }

    /// Queue `event` on the machine's event queue.
    ///
    /// Queued events run strictly, one at a time, in the order they were
    /// queued; their failures are logged by the queue. Events sent after the
    /// queue was shut down are logged and dropped.
    pub fn async_trigger(&self, event: &str, args: &[Value]) -> Result<(), MachineError> {
        let queue = &self.inner.event_queue;
        ensure_started(queue)?;
        let machine = self.downgrade();
        let event_name = event.to_string();
        let args = args.to_vec();
        queue.enqueue(Task::new(format!("async.{event}"), move || {
            let Some(machine) = machine.upgrade() else {
                return Ok(());
            };
            machine.trigger_strict(&event_name, &args)?;
            Ok(())
        }));
        Ok(())
    }

    fn run(
        &self,
        event: &str,
        args: &[Value],
        block: Option<CommitBlock<'_, S>>,
    ) -> Result<bool, MachineError> {
        let silent = self.inner.transitions.read().is_silent(event);
        self.attempt(event, args, silent, block)
    }

    fn attempt(
        &self,
        event: &str,
        args: &[Value],
        silent: bool,
        block: Option<CommitBlock<'_, S>>,
    ) -> Result<bool, MachineError> {
        let _serial = self.inner.serial.lock();
        let from = self.current();
        let initial = self.initial_state();
        // Owned by this attempt, so nested triggers cannot clear it.
        let cancelled = Cell::new(false);

        let result = if silent {
            self.move_silently(event, args, from.as_ref(), block)
        } else {
            self.move_notifying(event, args, from.as_ref(), &cancelled, block)
        };

        result.or_else(|err| {
            *self.inner.state.write() = from;
            *self.inner.initial_state.write() = initial;
            // Invalid-state errors were offered to the handlers already.
            if err.kind() != ErrorKind::InvalidState && self.catch_error(&err) {
                Ok(false)
            } else {
                Err(err)
            }
        })
    }

    fn move_notifying(
        &self,
        event: &str,
        args: &[Value],
        from: Option<&S>,
        cancelled: &Cell<bool>,
        block: Option<CommitBlock<'_, S>>,
    ) -> Result<bool, MachineError> {
        self.notify(HookKind::Before, event, from, args, cancelled)?;

        let status = if !self.check_valid(event, from)? || !self.can_from(event, from, args)? {
            false
        } else {
            self.notify(HookKind::Exit, event, from, args, cancelled)?;
            self.commit(event, from, args, cancelled.get(), block)?;
            self.notify(HookKind::Transition, event, from, args, cancelled)?;
            self.notify(HookKind::Enter, event, from, args, cancelled)?;
            true
        };

        self.notify(HookKind::After, event, from, args, cancelled)?;
        Ok(status)
    }

    fn move_silently(
        &self,
        event: &str,
        args: &[Value],
        from: Option<&S>,
        block: Option<CommitBlock<'_, S>>,
    ) -> Result<bool, MachineError> {
        if !self.check_valid(event, from)? || !self.can_from(event, from, args)? {
            return Ok(false);
        }
        self.commit(event, from, args, false, block)?;
        Ok(true)
    }

    /// `Ok(false)` when the state is invalid but a handler took the error.
    fn check_valid(&self, event: &str, from: Option<&S>) -> Result<bool, MachineError> {
        if self.inner.transitions.read().valid_state(event, from) {
            return Ok(true);
        }
        let err = MachineError::InvalidState {
            event: event.to_string(),
            state: state_name(from).to_string(),
        };
        if self.catch_error(&err) {
            Ok(false)
        } else {
            Err(err)
        }
    }

    fn can_from(
        &self,
        event: &str,
        from: Option<&S>,
        args: &[Value],
    ) -> Result<bool, MachineError> {
        self.inner
            .transitions
            .read()
            .can_perform(event, from, &self.inner.target, args)
    }

    /// Write the resolved state. A cancelled attempt writes nothing.
    fn commit(
        &self,
        event: &str,
        from: Option<&S>,
        args: &[Value],
        cancelled: bool,
        block: Option<CommitBlock<'_, S>>,
    ) -> Result<(), MachineError> {
        if cancelled {
            return Ok(());
        }
        let to = self
            .inner
            .transitions
            .read()
            .resolve(event, from, &self.inner.target, args)?
            .to_state(from);

        if let Some(block) = block {
            block(from, to.as_ref()).map_err(|err| MachineError::Transition {
                event: event.to_string(),
                from: state_name(from).to_string(),
                to: state_name(to.as_ref()).to_string(),
                message: format!("{err:#}"),
            })?;
        }

        if self.inner.config.log_transitions {
            self.inner
                .logger
                .info(&format_transition(event, from, to.as_ref(), args));
        }

        if from.is_none() {
            *self.inner.initial_state.write() = to.clone();
        }
        *self.inner.state.write() = to;
        Ok(())
    }

    fn notify(
        &self,
        kind: HookKind,
        event: &str,
        from: Option<&S>,
        args: &[Value],
        cancelled: &Cell<bool>,
    ) -> Result<(), MachineError> {
        let current = self.current();
        let hook = HookEvent::build(kind, current.as_ref(), event, from);

        for name in self.hook_names(&hook.name) {
            let callbacks = self.inner.hooks.read().find(kind, name);
            for callback in callbacks {
                let transition_event = TransitionEvent {
                    name: event.to_string(),
                    from: from.cloned(),
                    to: self.pending_to(event, from, args, cancelled)?,
                };
                match callback.kind() {
                    CallbackKind::Async => self.defer(&hook, callback, transition_event, args)?,
                    CallbackKind::Plain | CallbackKind::Once => {
                        let context =
                            HookContext::new(&self.inner.target, &transition_event, args);
                        let outcome = callback.call(&context)?;
                        if callback.kind() == CallbackKind::Once {
                            self.inner.hooks.write().unregister(kind, name, callback.id());
                        }
                        if outcome == Outcome::Cancelled {
                            self.cancel(event, from, args, cancelled)?;
                        }
                    }
                }
            }
        }

        let subscribers = self.inner.subscribers.read().clone();
        for subscriber in &subscribers {
            subscriber.visit(&hook, args);
        }
        Ok(())
    }

    fn hook_names<'a>(&self, name: &'a str) -> Vec<&'a str> {
        if name == ANY {
            return vec![ANY];
        }
        match self.inner.config.hook_order {
            HookOrder::SpecificFirst => vec![name, ANY],
            HookOrder::GenericFirst => vec![ANY, name],
        }
    }

    /// Where `event` leads from `from` right now, honouring cancellation.
    fn pending_to(
        &self,
        event: &str,
        from: Option<&S>,
        args: &[Value],
        cancelled: &Cell<bool>,
    ) -> Result<Option<S>, MachineError> {
        if cancelled.get() {
            return Ok(from.cloned());
        }
        Ok(self
            .inner
            .transitions
            .read()
            .resolve(event, from, &self.inner.target, args)?
            .to_state(from))
    }

    /// Mark the attempt cancelled when `event` resolves to a transition.
    fn cancel(
        &self,
        event: &str,
        from: Option<&S>,
        args: &[Value],
        cancelled: &Cell<bool>,
    ) -> Result<(), MachineError> {
        let resolution =
            self.inner
                .transitions
                .read()
                .resolve(event, from, &self.inner.target, args)?;
        if resolution.is_defined() {
            cancelled.set(true);
            self.inner.logger.debug(&format!(
                "event '{}' from '{}' cancelled by callback",
                event,
                state_name(from)
            ));
        }
        Ok(())
    }

    fn defer(
        &self,
        hook: &HookEvent<S>,
        callback: Arc<Callback<S, T>>,
        event: TransitionEvent<S>,
        args: &[Value],
    ) -> Result<(), MachineError> {
        let queue = &self.inner.callback_queue;
        ensure_started(queue)?;
        let machine = self.downgrade();
        let args = args.to_vec();
        queue.enqueue(Task::new(format!("{} {}", hook.kind, hook.name), move || {
            let Some(machine) = machine.upgrade() else {
                return Ok(());
            };
            let context = HookContext::new(machine.target(), &event, &args);
            callback.call(&context)?;
            Ok(())
        }));
        Ok(())
    }

    fn catch_error(&self, error: &MachineError) -> bool {
        let Some(handler) = self.inner.catches.read().find(error) else {
            return false;
        };
        match handler.invoke(&self.inner.target, error) {
            Ok(()) => true,
            Err(message) => {
                self.inner.logger.warn(&format!(
                    "error handler for {} failed: {}",
                    error.class_name(),
                    message
                ));
                false
            }
        }
    }
}
