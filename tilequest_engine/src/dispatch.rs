//! Contextual input dispatch.
//!
//! The [`Dispatcher`] owns the game's [`StateMachine`] and a registry of
//! listeners keyed by `(state, event type)`. An event reaches only the
//! listeners registered for the state the machine is in when the event is
//! dispatched, in registration order. A listener may fire transitions; the
//! remaining listeners for that event still run, because the list was chosen
//! before the first one was called.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;
use thiserror::Error;

use crate::fsm::{FsmError, StateMachine};
use crate::input::{EventSource, EventType, InputEvent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatcher has no state machine attached")]
    NotConfigured,
    #[error(transparent)]
    Transition(#[from] FsmError),
}

/// A listener receives the event, the state machine, and the caller's context.
pub type Listener<C> = fn(&InputEvent, &mut StateMachine<C>, &mut C) -> Result<(), DispatchError>;

pub struct Dispatcher<C> {
    fsm: Option<StateMachine<C>>,
    listeners: HashMap<(String, EventType), Vec<Listener<C>>>,
    registered: HashSet<String>,
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self {
            fsm: None,
            listeners: HashMap::new(),
            registered: HashSet::new(),
        }
    }
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the state machine whose state selects listeners. Replaces any previous one.
    pub fn attach(&mut self, fsm: StateMachine<C>) {
        self.fsm = Some(fsm);
    }

    pub fn fsm(&self) -> Option<&StateMachine<C>> {
        self.fsm.as_ref()
    }

    pub fn fsm_mut(&mut self) -> Option<&mut StateMachine<C>> {
        self.fsm.as_mut()
    }

    /// Append `listener` to the list for `(state, event_type)`.
    pub fn register(&mut self, state: &str, listener: Listener<C>, event_type: EventType) {
        debug!("listener registered for ({state}, {event_type:?})");
        self.listeners
            .entry((state.to_string(), event_type))
            .or_default()
            .push(listener);
    }

    /// Register a named listener for each of `states`, once per name.
    ///
    /// Returns `false` (and registers nothing) if `name` was already registered.
    pub fn register_listener(
        &mut self,
        name: &str,
        states: &[&str],
        event_type: EventType,
        listener: Listener<C>,
    ) -> bool {
        if !self.registered.insert(name.to_string()) {
            debug!("listener '{name}' already registered");
            return false;
        }
        for state in states {
            self.register(state, listener, event_type);
        }
        true
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.contains(name)
    }

    /// Number of listeners registered for `(state, event_type)`.
    pub fn listener_count(&self, state: &str, event_type: EventType) -> usize {
        self.listeners
            .get(&(state.to_string(), event_type))
            .map_or(0, Vec::len)
    }

    /// Run every listener registered for the current state and the event's type.
    ///
    /// Returns the number of listeners called. A missing entry is not an error.
    ///
    /// # Errors
    /// - [`DispatchError::NotConfigured`] if no state machine is attached
    /// - the first error a listener returns; later listeners do not run
    pub fn dispatch(&mut self, event: &InputEvent, ctx: &mut C) -> Result<usize, DispatchError> {
        let fsm = self.fsm.as_mut().ok_or(DispatchError::NotConfigured)?;
        let key = (fsm.state().to_string(), event.event_type());
        let Some(listeners) = self.listeners.get(&key) else {
            return Ok(0);
        };
        for listener in listeners {
            listener(event, fsm, ctx)?;
        }
        Ok(listeners.len())
    }

    /// Drain `source`, dispatching each event in arrival order.
    ///
    /// Returns the number of events handled.
    ///
    /// # Errors
    /// - the first dispatch error; unread events stay in the source
    pub fn handle_events(&mut self, source: &mut impl EventSource, ctx: &mut C) -> Result<usize, DispatchError> {
        if self.fsm.is_none() {
            return Err(DispatchError::NotConfigured);
        }
        let mut handled = 0;
        while let Some(event) = source.poll() {
            self.dispatch(&event, ctx)?;
            handled += 1;
        }
        Ok(handled)
    }
}

impl<C> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.listeners.iter().map(|(key, list)| (key, list.len())).collect();
        keys.sort();
        f.debug_struct("Dispatcher")
            .field("fsm", &self.fsm)
            .field("listeners", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::Transition;
    use crate::input::{Key, ScriptedEvents};

    #[derive(Debug, Default)]
    struct Calls {
        menu: usize,
        game: usize,
        order: Vec<&'static str>,
    }

    fn on_menu_key(_: &InputEvent, _: &mut StateMachine<Calls>, calls: &mut Calls) -> Result<(), DispatchError> {
        calls.menu += 1;
        Ok(())
    }

    fn start_game(_: &InputEvent, fsm: &mut StateMachine<Calls>, calls: &mut Calls) -> Result<(), DispatchError> {
        calls.order.push("start");
        fsm.fire("play", calls)?;
        Ok(())
    }

    fn after_start(_: &InputEvent, _: &mut StateMachine<Calls>, calls: &mut Calls) -> Result<(), DispatchError> {
        calls.order.push("after");
        Ok(())
    }

    fn on_game_key(_: &InputEvent, _: &mut StateMachine<Calls>, calls: &mut Calls) -> Result<(), DispatchError> {
        calls.game += 1;
        Ok(())
    }

    fn menu_machine() -> StateMachine<Calls> {
        StateMachine::new("menu", vec![Transition::new("play", "menu", "game")]).unwrap()
    }

    #[test]
    fn listeners_are_selected_by_state_and_type() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.attach(menu_machine());
        dispatcher.register("menu", on_menu_key, EventType::KeyDown);
        let mut calls = Calls::default();

        let key_down = InputEvent::KeyDown(Key::Return);
        assert_eq!(dispatcher.dispatch(&key_down, &mut calls).unwrap(), 1);
        assert_eq!(calls.menu, 1);

        assert_eq!(dispatcher.dispatch(&InputEvent::KeyUp(Key::Return), &mut calls).unwrap(), 0);
        assert_eq!(calls.menu, 1);

        dispatcher.fsm_mut().unwrap().fire("play", &mut calls).unwrap();
        assert_eq!(dispatcher.dispatch(&key_down, &mut calls).unwrap(), 0);
        assert_eq!(calls.menu, 1);
    }

    #[test]
    fn dispatch_without_machine_is_not_configured() {
        let mut dispatcher = Dispatcher::<Calls>::new();
        let result = dispatcher.dispatch(&InputEvent::Quit, &mut Calls::default());
        assert_eq!(result.unwrap_err(), DispatchError::NotConfigured);
        let mut events = ScriptedEvents::new([InputEvent::Quit]);
        assert!(dispatcher.handle_events(&mut events, &mut Calls::default()).is_err());
    }

    #[test]
    fn listener_list_is_fixed_for_the_current_event() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.attach(menu_machine());
        dispatcher.register("menu", start_game, EventType::KeyDown);
        dispatcher.register("menu", after_start, EventType::KeyDown);
        dispatcher.register("game", on_game_key, EventType::KeyDown);
        let mut calls = Calls::default();

        dispatcher.dispatch(&InputEvent::KeyDown(Key::Space), &mut calls).unwrap();
        assert_eq!(calls.order, ["start", "after"]);
        assert_eq!(calls.game, 0);
        assert_eq!(dispatcher.fsm().unwrap().state(), "game");
    }

    #[test]
    fn handle_events_drains_source_in_order() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.attach(menu_machine());
        dispatcher.register("menu", start_game, EventType::KeyDown);
        dispatcher.register("game", on_game_key, EventType::KeyDown);
        let mut events = ScriptedEvents::new([
            InputEvent::KeyDown(Key::Space),
            InputEvent::KeyDown(Key::Up),
            InputEvent::KeyDown(Key::Down),
        ]);
        let mut calls = Calls::default();
        assert_eq!(dispatcher.handle_events(&mut events, &mut calls).unwrap(), 3);
        assert_eq!(calls.game, 2);
        assert!(events.is_empty());
    }

    #[test]
    fn listener_errors_propagate() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.attach(menu_machine());
        dispatcher.register("menu", start_game, EventType::KeyDown);
        dispatcher.register("game", start_game, EventType::KeyDown);
        let mut events = ScriptedEvents::new([
            InputEvent::KeyDown(Key::Space),
            InputEvent::KeyDown(Key::Space),
            InputEvent::Quit,
        ]);
        let err = dispatcher.handle_events(&mut events, &mut Calls::default()).unwrap_err();
        assert!(matches!(err, DispatchError::Transition(FsmError::IllegalTransition { .. })));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn named_registration_is_idempotent() {
        let mut dispatcher = Dispatcher::<Calls>::new();
        assert!(dispatcher.register_listener("menu_key", &["menu", "game"], EventType::KeyDown, on_menu_key));
        assert!(!dispatcher.register_listener("menu_key", &["menu"], EventType::KeyDown, on_menu_key));
        assert!(dispatcher.is_registered("menu_key"));
        assert_eq!(dispatcher.listener_count("menu", EventType::KeyDown), 1);
        assert_eq!(dispatcher.listener_count("game", EventType::KeyDown), 1);
    }
}
