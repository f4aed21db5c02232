//! Builder for constructing state machines.

use crate::builder::choice::ChoiceBuilder;
use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::config::{HookOrder, InitialOptions, MachineConfig};
use crate::core::{Guard, HookKind, Source, State, Transition};
use crate::logger::{Logger, TracingLogger};
use crate::machine::{ErrorHandler, ErrorSelector, MachineError, StateMachine};
use crate::observer::{Callback, CallbackKind, HookContext, IntoOutcome, Subscriber};
use crate::target::Target;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

struct InitialSpec<S> {
    state: Option<S>,
    options: InitialOptions,
}

struct HookSpec<S: State, T> {
    kind: HookKind,
    name: String,
    callback: Callback<S, T>,
}

/// Builder for constructing state machines with a fluent API.
///
/// Definition problems are collected rather than reported one by one:
/// [`build`](MachineBuilder::build) returns every invalid event and callback
/// name in a single [`BuildError`].
pub struct MachineBuilder<S: State, T: Target = ()> {
    target: T,
    initial: Option<InitialSpec<S>>,
    terminals: Vec<S>,
    events: Vec<Result<Vec<Transition<S, T>>, MachineError>>,
    hooks: Vec<HookSpec<S, T>>,
    handlers: Vec<(ErrorSelector, ErrorHandler<T>)>,
    subscribers: Vec<Arc<dyn Subscriber<S>>>,
    config: MachineConfig,
    logger: Arc<dyn Logger>,
}

impl<S: State> MachineBuilder<S, ()> {
    /// Create a builder for a machine without a target.
    pub fn new() -> Self {
        Self::with_target(())
    }
}

impl<S: State> Default for MachineBuilder<S, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, T: Target> MachineBuilder<S, T> {
    /// Create a builder whose guards and callbacks see `target`.
    pub fn with_target(target: T) -> Self {
        Self {
            target,
            initial: None,
            terminals: Vec::new(),
            events: Vec::new(),
            hooks: Vec::new(),
            handlers: Vec::new(),
            subscribers: Vec::new(),
            config: MachineConfig::default(),
            logger: Arc::new(TracingLogger),
        }
    }

    /// Set the initial state, entered silently on build.
    pub fn initial(self, state: S) -> Self {
        self.set_initial(Some(state), InitialOptions::default())
    }

    /// Set the initial state without entering it.
    ///
    /// The machine stays in `none` until the initial event is triggered.
    pub fn defer_initial(self, state: S) -> Self {
        self.set_initial(
            Some(state),
            InitialOptions {
                defer: true,
                ..InitialOptions::default()
            },
        )
    }

    /// Declare the initial state. A missing state fails the build.
    pub fn set_initial(mut self, state: Option<S>, options: InitialOptions) -> Self {
        self.initial = Some(InitialSpec { state, options });
        self
    }

    pub fn terminal(mut self, state: S) -> Self {
        self.terminals.push(state);
        self
    }

    pub fn terminals(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.terminals.extend(states);
        self
    }

    /// Add a transition using a builder.
    ///
    /// Repeating an event name appends to its transitions.
    pub fn event(mut self, name: &str, transition: TransitionBuilder<S, T>) -> Self {
        self.events
            .push(transition.build(name).map(|transition| vec![transition]));
        self
    }

    /// Add a choice event whose branches are tried in order.
    pub fn choice(mut self, name: &str, choice: ChoiceBuilder<S, T>) -> Self {
        self.events.push(choice.build(name));
        self
    }

    pub fn register_transition(
        mut self,
        name: &str,
        from: Vec<Source<S>>,
        to: S,
        guards: Vec<Guard<T>>,
        silent: bool,
    ) -> Self {
        let states = from.into_iter().map(|source| (source, to.clone())).collect();
        self.events.push(
            Transition::new(name, states, guards).map(|transition| vec![transition.silent(silent)]),
        );
        self
    }

    /// Register a callback under a state or event name, or [`ANY`](crate::core::ANY).
    pub fn register_hook<F, R>(
        mut self,
        kind: HookKind,
        name: &str,
        callback_kind: CallbackKind,
        f: F,
    ) -> Self
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.hooks.push(HookSpec {
            kind,
            name: name.to_string(),
            callback: Callback::new(callback_kind, f),
        });
        self
    }

    pub fn on_before<F, R>(self, event: &str, f: F) -> Self
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.register_hook(HookKind::Before, event, CallbackKind::Plain, f)
    }

    pub fn on_exit<F, R>(self, state: &str, f: F) -> Self
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.register_hook(HookKind::Exit, state, CallbackKind::Plain, f)
    }

    pub fn on_transition<F, R>(self, state: &str, f: F) -> Self
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.register_hook(HookKind::Transition, state, CallbackKind::Plain, f)
    }

    pub fn on_enter<F, R>(self, state: &str, f: F) -> Self
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.register_hook(HookKind::Enter, state, CallbackKind::Plain, f)
    }

    pub fn on_after<F, R>(self, event: &str, f: F) -> Self
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.register_hook(HookKind::After, event, CallbackKind::Plain, f)
    }

    /// Callback dropped after its first successful run.
    pub fn once<F, R>(self, kind: HookKind, name: &str, f: F) -> Self
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.register_hook(kind, name, CallbackKind::Once, f)
    }

    /// Callback run on the machine's callback queue.
    pub fn on_async<F, R>(self, kind: HookKind, name: &str, f: F) -> Self
    where
        F: Fn(&HookContext<'_, S, T>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.register_hook(kind, name, CallbackKind::Async, f)
    }

    pub fn handle(mut self, selector: impl Into<ErrorSelector>, handler: ErrorHandler<T>) -> Self {
        self.handlers.push((selector.into(), handler));
        self
    }

    pub fn subscribe<O>(mut self, subscriber: O) -> Self
    where
        O: Subscriber<S> + 'static,
    {
        self.subscribers.push(Arc::new(subscriber));
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn log_transitions(mut self, enabled: bool) -> Self {
        self.config.log_transitions = enabled;
        self
    }

    pub fn hook_order(mut self, order: HookOrder) -> Self {
        self.config.hook_order = order;
        self
    }

    pub fn logger<L>(mut self, logger: L) -> Self
    where
        L: Logger + 'static,
    {
        self.logger = Arc::new(logger);
        self
    }

    /// Build the state machine and enter its initial state.
    ///
    /// Returns every definition error at once. Errors raised while entering
    /// the initial state are reported as a single-error [`BuildError`].
    pub fn build(self) -> Result<StateMachine<S, T>, BuildError> {
        let machine = StateMachine::new(self.target, self.terminals, self.config, self.logger);
        let mut checks: Vec<Validation<(), NonEmptyVec<MachineError>>> = Vec::new();

        let initial = match self.initial {
            Some(InitialSpec {
                state: Some(state),
                options,
            }) => {
                checks.push(validate(machine.register_transition(
                    &options.event,
                    vec![Source::None],
                    state,
                    Vec::new(),
                    options.silent,
                )));
                Some(options)
            }
            Some(InitialSpec { state: None, .. }) => {
                checks.push(Validation::fail(MachineError::MissingInitialState));
                None
            }
            None => None,
        };

        for event in self.events {
            checks.push(validate(event.and_then(|transitions| {
                transitions
                    .into_iter()
                    .try_for_each(|transition| machine.add_transition(transition))
            })));
        }

        // Hook names are checked against the complete set of states and events.
        for hook in self.hooks {
            checks.push(validate(
                machine
                    .register_callback(hook.kind, &hook.name, hook.callback)
                    .map(|_| ()),
            ));
        }

        if let Validation::Failure(errors) = Validation::all_vec(checks).map(|_| ()) {
            return Err(BuildError::new(errors.iter().cloned().collect()));
        }

        for (selector, handler) in self.handlers {
            machine.handle(selector, handler);
        }
        for subscriber in self.subscribers {
            machine.inner.subscribers.write().push(subscriber);
        }

        if let Some(options) = initial.filter(|options| !options.defer) {
            machine.trigger_strict(&options.event, &[])?;
        }
        Ok(machine)
    }
}

fn validate(result: Result<(), MachineError>) -> Validation<(), NonEmptyVec<MachineError>> {
    match result {
        Ok(()) => Validation::success(()),
        Err(err) => Validation::fail(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ANY, NONE};
    use parking_lot::Mutex;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Initial,
        Processing,
        Complete,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Initial => "initial",
                Self::Processing => "processing",
                Self::Complete => "complete",
            }
        }
    }

    fn process() -> TransitionBuilder<TestState, ()> {
        TransitionBuilder::new()
            .from(TestState::Initial)
            .to(TestState::Processing)
    }

    #[test]
    fn builder_enters_initial_state() {
        let machine = MachineBuilder::new()
            .initial(TestState::Initial)
            .event("process", process())
            .build()
            .unwrap();

        assert_eq!(machine.current(), Some(TestState::Initial));
        assert_eq!(machine.initial_state(), Some(TestState::Initial));
        assert_eq!(machine.event_names(), vec!["init", "process"]);
    }

    #[test]
    fn machine_without_initial_starts_in_none() {
        let machine = MachineBuilder::new()
            .event("process", process())
            .build()
            .unwrap();
        assert_eq!(machine.current(), None);
    }

    #[test]
    fn missing_initial_state_is_reported() {
        let result = MachineBuilder::<TestState>::new()
            .set_initial(None, InitialOptions::default())
            .build();

        let err = result.unwrap_err();
        assert_eq!(err.errors, vec![MachineError::MissingInitialState]);
    }

    #[test]
    fn builder_accumulates_all_errors() {
        let result = MachineBuilder::new()
            .set_initial(None, InitialOptions::default())
            .event("current", process())
            .event("empty", TransitionBuilder::new())
            .on_enter("nowhere", |_: &HookContext<'_, TestState, ()>| {})
            .build();

        let err = result.unwrap_err();
        assert_eq!(err.len(), 4);
        assert!(err
            .errors()
            .iter()
            .any(|e| matches!(e, MachineError::AlreadyDefined { name } if name == "current")));
        assert!(err
            .errors()
            .iter()
            .any(|e| matches!(e, MachineError::NotEnoughTransitions { .. })));
        assert!(err
            .errors()
            .iter()
            .any(|e| matches!(e, MachineError::InvalidCallbackName { .. })));
    }

    #[test]
    fn reserved_check_can_be_disabled() {
        let config = MachineConfig {
            reserved_names_check: false,
            ..MachineConfig::default()
        };
        let machine = MachineBuilder::new()
            .config(config)
            .initial(TestState::Initial)
            .event("current", process())
            .build()
            .unwrap();
        assert!(machine.trigger("current", &[]).unwrap());
    }

    #[test]
    fn deferred_initial_waits_for_init_event() {
        let machine = MachineBuilder::new()
            .defer_initial(TestState::Initial)
            .event("process", process())
            .build()
            .unwrap();

        assert_eq!(machine.current(), None);
        assert!(machine.trigger("init", &[]).unwrap());
        assert_eq!(machine.current(), Some(TestState::Initial));
    }

    #[test]
    fn loud_initial_fires_hooks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let exits = Arc::clone(&seen);
        let enters = Arc::clone(&seen);

        let options = InitialOptions {
            event: "boot".to_string(),
            silent: false,
            ..InitialOptions::default()
        };
        MachineBuilder::new()
            .set_initial(Some(TestState::Initial), options)
            .on_exit(NONE, move |_: &HookContext<'_, TestState, ()>| {
                exits.lock().push("exit_none".to_string())
            })
            .on_enter(ANY, move |ctx: &HookContext<'_, TestState, ()>| {
                enters.lock().push(format!("enter {}", ctx.event()))
            })
            .build()
            .unwrap();

        assert_eq!(
            *seen.lock(),
            vec!["exit_none".to_string(), "enter boot: none -> initial".to_string()]
        );
    }

    #[test]
    fn register_transition_accepts_several_sources() {
        let machine = MachineBuilder::new()
            .initial(TestState::Processing)
            .register_transition(
                "finish",
                vec![Source::State(TestState::Initial), Source::State(TestState::Processing)],
                TestState::Complete,
                Vec::new(),
                false,
            )
            .build()
            .unwrap();

        assert!(machine.trigger("finish", &[]).unwrap());
        assert!(machine.is(&TestState::Complete));
    }
}
