//! Input events as the engine sees them.
//!
//! The windowing/input backend is external; it translates whatever it
//! receives into [`InputEvent`]s and hands them over through an
//! [`EventSource`]. [`ScriptedEvents`] is a queue-backed source used for
//! headless runs and tests.

use std::collections::VecDeque;

use variantly::Variantly;

/// Keys the game reacts to. Anything else is carried as its raw code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Return,
    Space,
    Escape,
    Other(u32),
}

impl Key {
    /// Return and space both confirm.
    pub fn is_confirm(self) -> bool {
        matches!(self, Key::Return | Key::Space)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMotion {
    pub axis: u8,
    /// Normalized deflection in `-1.0..=1.0`.
    pub value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Variantly)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    Quit,
    JoyAxisMotion(AxisMotion),
}

impl InputEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            InputEvent::KeyDown(_) => EventType::KeyDown,
            InputEvent::KeyUp(_) => EventType::KeyUp,
            InputEvent::Quit => EventType::Quit,
            InputEvent::JoyAxisMotion(_) => EventType::JoyAxisMotion,
        }
    }
}

/// The payload-free kind of an [`InputEvent`]; half of a dispatcher key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum EventType {
    #[default]
    KeyDown,
    KeyUp,
    Quit,
    JoyAxisMotion,
}

/// Produces the input events that arrived since the last poll.
pub trait EventSource {
    fn poll(&mut self) -> Option<InputEvent>;
}

/// A fixed, ordered queue of events.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEvents {
    queue: VecDeque<InputEvent>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            queue: events.into_iter().collect(),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl EventSource for ScriptedEvents {
    fn poll(&mut self) -> Option<InputEvent> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_report_their_type() {
        assert_eq!(InputEvent::KeyDown(Key::Up).event_type(), EventType::KeyDown);
        assert_eq!(InputEvent::KeyUp(Key::Up).event_type(), EventType::KeyUp);
        assert_eq!(InputEvent::Quit.event_type(), EventType::Quit);
        let motion = InputEvent::JoyAxisMotion(AxisMotion { axis: 0, value: 0.5 });
        assert_eq!(motion.event_type(), EventType::JoyAxisMotion);
        assert!(motion.is_joy_axis_motion());
    }

    #[test]
    fn scripted_events_drain_in_order() {
        let mut source = ScriptedEvents::new([InputEvent::KeyDown(Key::Space), InputEvent::Quit]);
        source.push(InputEvent::KeyUp(Key::Space));
        assert_eq!(source.len(), 3);
        assert_eq!(source.poll(), Some(InputEvent::KeyDown(Key::Space)));
        assert_eq!(source.poll(), Some(InputEvent::Quit));
        assert_eq!(source.poll(), Some(InputEvent::KeyUp(Key::Space)));
        assert_eq!(source.poll(), None);
        assert!(source.is_empty());
    }

    #[test]
    fn confirm_keys() {
        assert!(Key::Return.is_confirm());
        assert!(Key::Space.is_confirm());
        assert!(!Key::Escape.is_confirm());
    }
}
