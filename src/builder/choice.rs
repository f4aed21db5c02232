//! Builder for choice events: one source, several guarded targets.

use crate::core::{Guard, Source, State, Transition};
use crate::machine::MachineError;
use crate::target::Target;
use serde_json::Value;

/// Branches of a choice pseudostate, tried in declaration order.
///
/// Each branch becomes its own transition under the event name, so the
/// registry treats the event as a branch point and the first branch whose
/// guards pass wins.
pub struct ChoiceBuilder<S: State, T> {
    sources: Vec<Source<S>>,
    branches: Vec<(S, Vec<Guard<T>>)>,
    silent: bool,
}

impl<S: State, T: Target> ChoiceBuilder<S, T> {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            branches: Vec::new(),
            silent: false,
        }
    }

    pub fn from(mut self, state: S) -> Self {
        self.sources.push(Source::State(state));
        self
    }

    pub fn from_any(mut self) -> Self {
        self.sources.push(Source::Any);
        self
    }

    /// Branch to `to` when `guard` passes.
    pub fn choice(mut self, to: S, guard: Guard<T>) -> Self {
        self.branches.push((to, vec![guard]));
        self
    }

    pub fn when<F>(self, to: S, predicate: F) -> Self
    where
        F: Fn(&T, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.choice(to, Guard::new(predicate))
    }

    /// Unconditional branch, taken when no earlier branch passes.
    pub fn default(mut self, to: S) -> Self {
        self.branches.push((to, Vec::new()));
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// One transition per branch. Without sources the choice applies from
    /// any state.
    pub fn build(self, event: &str) -> Result<Vec<Transition<S, T>>, MachineError> {
        if self.branches.is_empty() {
            return Err(MachineError::NotEnoughTransitions {
                event: event.to_string(),
            });
        }
        let sources = if self.sources.is_empty() {
            vec![Source::Any]
        } else {
            self.sources
        };
        let silent = self.silent;
        self.branches
            .into_iter()
            .map(|(to, guards)| {
                let states = sources
                    .iter()
                    .map(|source| (source.clone(), to.clone()))
                    .collect();
                Transition::new(event, states, guards).map(|transition| transition.silent(silent))
            })
            .collect()
    }
}

impl<S: State, T: Target> Default for ChoiceBuilder<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TransitionRegistry;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Order {
        Placed,
        Express,
        Standard,
        Pickup,
    }

    impl State for Order {
        fn name(&self) -> &str {
            match self {
                Self::Placed => "placed",
                Self::Express => "express",
                Self::Standard => "standard",
                Self::Pickup => "pickup",
            }
        }
    }

    fn shipping() -> TransitionRegistry<Order, ()> {
        let transitions = ChoiceBuilder::new()
            .from(Order::Placed)
            .when(Order::Express, |_, args| args.first() == Some(&json!("express")))
            .when(Order::Pickup, |_, args| args.first() == Some(&json!("pickup")))
            .default(Order::Standard)
            .build("ship")
            .unwrap();

        let mut registry = TransitionRegistry::new();
        for transition in transitions {
            registry.add(transition);
        }
        registry
    }

    fn ship(registry: &TransitionRegistry<Order, ()>, args: &[Value]) -> Option<Order> {
        registry
            .resolve("ship", Some(&Order::Placed), &(), args)
            .unwrap()
            .to_state(Some(&Order::Placed))
    }

    #[test]
    fn first_passing_branch_wins() {
        let registry = shipping();
        assert_eq!(ship(&registry, &[json!("express")]), Some(Order::Express));
        assert_eq!(ship(&registry, &[json!("pickup")]), Some(Order::Pickup));
    }

    #[test]
    fn default_branch_catches_the_rest() {
        let registry = shipping();
        assert_eq!(ship(&registry, &[]), Some(Order::Standard));
    }

    #[test]
    fn empty_choice_is_rejected() {
        let result = ChoiceBuilder::<Order, ()>::new().from(Order::Placed).build("ship");
        assert!(matches!(result, Err(MachineError::NotEnoughTransitions { .. })));
    }

    #[test]
    fn choice_without_sources_applies_everywhere() {
        let transitions = ChoiceBuilder::<Order, ()>::new()
            .default(Order::Placed)
            .build("reorder")
            .unwrap();
        assert!(transitions[0].matches(Some(&Order::Standard)));
    }
}
