//! Finite state machine.
//!
//! A [`StateMachine`] is built from a fixed table of named [`Transition`]s.
//! Transitions are fired by name through [`StateMachine::fire`]; a transition
//! only fires from one of its declared source states. Each `(name, source)`
//! pair appears at most once, so the destination is always unique.
//!
//! Callbacks receive the caller's context `A`. A `before` callback can veto a
//! transition by returning `false`; an `after` callback runs once the state has
//! changed and its return value is handed back to the caller.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use log::info;
use thiserror::Error;

/// Names that cannot be used for transitions.
pub const RESERVED_NAMES: [&str; 5] = ["", "can", "is_state", "fire", "state"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    #[error("'{0}' is a reserved name and cannot be used for a transition")]
    IllegalName(String),
    #[error("transition '{name}' is declared twice from state '{state}'")]
    DuplicateTransition { name: String, state: String },
    #[error("no transition named '{0}'")]
    UnknownTransition(String),
    #[error("transition '{name}' is illegal from state '{state}'")]
    IllegalTransition { name: String, state: String },
}

/// One row of the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub name: String,
    pub source: String,
    pub destination: String,
}

impl Transition {
    pub fn new(name: impl Into<String>, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            destination: destination.into(),
        }
    }
}

type Callback<A> = Box<dyn FnMut(&mut A) -> bool>;

pub struct StateMachine<A> {
    state: String,
    initial: String,
    transitions: Vec<Transition>,
    before: HashMap<String, Callback<A>>,
    after: HashMap<String, Callback<A>>,
}

impl<A> StateMachine<A> {
    /// Build a machine in state `initial` from a transition table.
    ///
    /// # Errors
    /// - [`FsmError::IllegalName`] if a transition uses a reserved name
    /// - [`FsmError::DuplicateTransition`] if a `(name, source)` pair repeats
    pub fn new(initial: impl Into<String>, transitions: Vec<Transition>) -> Result<Self, FsmError> {
        let mut seen = HashSet::new();
        for transition in &transitions {
            if RESERVED_NAMES.contains(&transition.name.as_str()) {
                return Err(FsmError::IllegalName(transition.name.clone()));
            }
            if !seen.insert((transition.name.as_str(), transition.source.as_str())) {
                return Err(FsmError::DuplicateTransition {
                    name: transition.name.clone(),
                    state: transition.source.clone(),
                });
            }
        }

        let initial = initial.into();
        Ok(Self {
            state: initial.clone(),
            initial,
            transitions,
            before: HashMap::new(),
            after: HashMap::new(),
        })
    }

    /// Register a callback that runs before `name` fires and may veto it.
    ///
    /// # Errors
    /// - [`FsmError::UnknownTransition`] if no transition is called `name`
    pub fn on_before<F>(&mut self, name: &str, callback: F) -> Result<(), FsmError>
    where
        F: FnMut(&mut A) -> bool + 'static,
    {
        self.require_known(name)?;
        self.before.insert(name.to_string(), Box::new(callback));
        Ok(())
    }

    /// Register a callback that runs after `name` has changed the state.
    ///
    /// # Errors
    /// - [`FsmError::UnknownTransition`] if no transition is called `name`
    pub fn on_after<F>(&mut self, name: &str, callback: F) -> Result<(), FsmError>
    where
        F: FnMut(&mut A) -> bool + 'static,
    {
        self.require_known(name)?;
        self.after.insert(name.to_string(), Box::new(callback));
        Ok(())
    }

    /// Fire the transition called `name` from the current state.
    ///
    /// Returns `false` when a `before` callback vetoed the transition (the
    /// state is unchanged), otherwise the `after` callback's result, or `true`
    /// when there is none.
    ///
    /// # Errors
    /// - [`FsmError::UnknownTransition`] if no transition is called `name`
    /// - [`FsmError::IllegalTransition`] if `name` does not leave the current state
    pub fn fire(&mut self, name: &str, ctx: &mut A) -> Result<bool, FsmError> {
        self.require_known(name)?;
        let Some(destination) = self.destination(name) else {
            return Err(FsmError::IllegalTransition {
                name: name.to_string(),
                state: self.state.clone(),
            });
        };
        let destination = destination.to_string();

        if let Some(before) = self.before.get_mut(name)
            && !before(ctx)
        {
            info!("transition '{name}' vetoed in state '{}'", self.state);
            return Ok(false);
        }

        info!("transition '{name}': {} -> {destination}", self.state);
        self.state = destination;

        match self.after.get_mut(name) {
            Some(after) => Ok(after(ctx)),
            None => Ok(true),
        }
    }

    /// True if `name` can fire from the current state.
    pub fn can(&self, name: &str) -> bool {
        self.destination(name).is_some()
    }

    pub fn is_state(&self, state: &str) -> bool {
        self.state == state
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// Every state the table mentions, plus the initial state.
    pub fn states(&self) -> BTreeSet<&str> {
        let mut states: BTreeSet<&str> = self
            .transitions
            .iter()
            .flat_map(|t| [t.source.as_str(), t.destination.as_str()])
            .collect();
        states.insert(&self.initial);
        states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    fn destination(&self, name: &str) -> Option<&str> {
        self.transitions
            .iter()
            .find(|t| t.name == name && t.source == self.state)
            .map(|t| t.destination.as_str())
    }

    fn require_known(&self, name: &str) -> Result<(), FsmError> {
        if self.transitions.iter().any(|t| t.name == name) {
            Ok(())
        } else {
            Err(FsmError::UnknownTransition(name.to_string()))
        }
    }
}

impl<A> fmt::Debug for StateMachine<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.state)
            .field("transitions", &self.transitions)
            .field("before", &self.before.keys().collect::<Vec<_>>())
            .field("after", &self.after.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<&'static str>;

    fn door() -> StateMachine<Log> {
        StateMachine::new(
            "closed",
            vec![
                Transition::new("open", "closed", "open"),
                Transition::new("close", "open", "closed"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn open_then_open_again_is_illegal() {
        let mut fsm = door();
        let mut log = Vec::new();
        assert!(fsm.fire("open", &mut log).unwrap());
        assert!(fsm.is_state("open"));
        let err = fsm.fire("open", &mut log).unwrap_err();
        assert_eq!(
            err,
            FsmError::IllegalTransition {
                name: "open".into(),
                state: "open".into()
            }
        );
        assert!(fsm.is_state("open"));
    }

    #[test]
    fn can_reflects_current_state() {
        let mut fsm = door();
        assert!(fsm.can("open"));
        assert!(!fsm.can("close"));
        fsm.fire("open", &mut Vec::new()).unwrap();
        assert!(fsm.can("close"));
        assert!(!fsm.can("unknown"));
    }

    #[test]
    fn veto_keeps_state_and_skips_after() {
        let mut fsm = StateMachine::<Log>::new("a", vec![Transition::new("advance", "a", "b")]).unwrap();
        fsm.on_before("advance", |log| {
            log.push("before");
            false
        })
        .unwrap();
        fsm.on_after("advance", |log| {
            log.push("after");
            true
        })
        .unwrap();

        let mut log = Vec::new();
        assert!(!fsm.fire("advance", &mut log).unwrap());
        assert!(fsm.is_state("a"));
        assert_eq!(log, ["before"]);
    }

    #[test]
    fn after_result_is_returned() {
        let mut fsm = door();
        fsm.on_before("open", |log| {
            log.push("before");
            true
        })
        .unwrap();
        fsm.on_after("open", |log| {
            log.push("after");
            false
        })
        .unwrap();
        let mut log = Vec::new();
        assert!(!fsm.fire("open", &mut log).unwrap());
        assert!(fsm.is_state("open"));
        assert_eq!(log, ["before", "after"]);
    }

    #[test]
    fn reserved_names_are_rejected() {
        for name in ["can", "is_state", ""] {
            let result = StateMachine::<()>::new("a", vec![Transition::new(name, "a", "b")]);
            assert_eq!(result.unwrap_err(), FsmError::IllegalName(name.into()));
        }
    }

    #[test]
    fn duplicate_name_and_source_is_rejected() {
        let result = StateMachine::<()>::new(
            "a",
            vec![Transition::new("go", "a", "b"), Transition::new("go", "a", "c")],
        );
        assert!(matches!(result, Err(FsmError::DuplicateTransition { .. })));
    }

    #[test]
    fn shared_name_with_distinct_sources_is_allowed() {
        let mut fsm = StateMachine::new(
            "a",
            vec![Transition::new("exit", "a", "done"), Transition::new("exit", "b", "done")],
        )
        .unwrap();
        assert!(fsm.fire("exit", &mut ()).unwrap());
        assert_eq!(fsm.state(), "done");
        assert_eq!(fsm.states().into_iter().collect::<Vec<_>>(), ["a", "b", "done"]);
    }

    #[test]
    fn unknown_names_are_reported() {
        let mut fsm = door();
        assert_eq!(
            fsm.fire("smash", &mut Vec::new()).unwrap_err(),
            FsmError::UnknownTransition("smash".into())
        );
        assert!(fsm.on_before("smash", |_| true).is_err());
    }
}
