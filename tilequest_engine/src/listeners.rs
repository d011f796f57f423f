//! Input listeners for the game states.
//!
//! Each listener is registered once, by name, for the states where it applies.
//! Listeners only react to the keys they care about and ignore everything else.

use log::debug;

use crate::dispatch::{DispatchError, Dispatcher};
use crate::fsm::StateMachine;
use crate::game::Session;
use crate::game::states::{ENDSCREEN, ITEM, MAIN, PLAYING, QUESTION, SPLASH};
use crate::game::transitions::{ANSWER, EXIT, FINISH, ITEM_COLLECTED, START};
use crate::input::{EventType, InputEvent, Key};
use crate::map::Direction;

type Fsm = StateMachine<Session>;
type Outcome = Result<(), DispatchError>;

/// Register the standard listeners on `dispatcher`.
pub fn register_all(dispatcher: &mut Dispatcher<Session>) {
    dispatcher.register_listener("splash", &[SPLASH], EventType::KeyDown, splash);
    dispatcher.register_listener("endscreen", &[ENDSCREEN], EventType::KeyDown, endscreen);
    dispatcher.register_listener("quit_escape", &PLAYING, EventType::KeyDown, quit_escape);
    dispatcher.register_listener("quit_window", &PLAYING, EventType::Quit, quit_window);
    dispatcher.register_listener("move_player", &[MAIN], EventType::KeyDown, move_player);
    dispatcher.register_listener("move_player_joystick", &[MAIN], EventType::JoyAxisMotion, move_player_joystick);
    dispatcher.register_listener("select_answer", &[QUESTION], EventType::KeyDown, select_answer);
    dispatcher.register_listener("item_acknowledged", &[ITEM], EventType::KeyDown, item_acknowledged);
}

fn confirmed(event: &InputEvent) -> bool {
    event.key_down().is_some_and(Key::is_confirm)
}

fn splash(event: &InputEvent, fsm: &mut Fsm, session: &mut Session) -> Outcome {
    if confirmed(event) {
        fsm.fire(START, session)?;
    }
    Ok(())
}

fn endscreen(event: &InputEvent, fsm: &mut Fsm, session: &mut Session) -> Outcome {
    if confirmed(event) {
        fsm.fire(EXIT, session)?;
    }
    Ok(())
}

fn quit_escape(event: &InputEvent, fsm: &mut Fsm, session: &mut Session) -> Outcome {
    if event.key_down() == Some(Key::Escape) && fsm.can(EXIT) {
        fsm.fire(EXIT, session)?;
    }
    Ok(())
}

fn quit_window(_event: &InputEvent, fsm: &mut Fsm, session: &mut Session) -> Outcome {
    if fsm.can(EXIT) {
        fsm.fire(EXIT, session)?;
    }
    Ok(())
}

fn move_player(event: &InputEvent, _fsm: &mut Fsm, session: &mut Session) -> Outcome {
    let direction = match event.key_down() {
        Some(Key::Up) => Direction::Up,
        Some(Key::Down) => Direction::Down,
        Some(Key::Left) => Direction::Left,
        Some(Key::Right) => Direction::Right,
        _ => return Ok(()),
    };
    session.player.step(direction, &session.level.map);
    Ok(())
}

/// The first deflection from center moves at once; holding the stick repeats
/// a move every `joystick.delay` milliseconds.
fn move_player_joystick(event: &InputEvent, _fsm: &mut Fsm, session: &mut Session) -> Outcome {
    let Some(motion) = event.joy_axis_motion() else {
        return Ok(());
    };
    let now = session.now;
    let player = &mut session.player;
    let joystick = &mut session.config.joystick;

    if motion.value == 0.0 {
        player.neutral = true;
        joystick.pressed = 0;
        return Ok(());
    }

    let mut step = false;
    if player.neutral {
        step = true;
        player.neutral = false;
    } else {
        joystick.pressed += now.saturating_sub(player.last_updated.unwrap_or(now));
    }
    if joystick.pressed > joystick.delay {
        step = true;
        joystick.pressed -= joystick.delay;
    }
    player.last_updated = Some(now);

    if step {
        let direction = match (motion.axis, motion.value > 0.0) {
            (0, true) => Direction::Right,
            (0, false) => Direction::Left,
            (1, true) => Direction::Up,
            (1, false) => Direction::Down,
            _ => return Ok(()),
        };
        debug!("joystick axis {} moves player {direction:?}", motion.axis);
        player.step(direction, &session.level.map);
    }
    Ok(())
}

fn select_answer(event: &InputEvent, fsm: &mut Fsm, session: &mut Session) -> Outcome {
    match event.key_down() {
        Some(key) if key.is_confirm() => {
            fsm.fire(ANSWER, session)?;
        },
        Some(Key::Up) => session.questions_mut().select_previous(),
        Some(Key::Down) => session.questions_mut().select_next(),
        _ => {},
    }
    Ok(())
}

fn item_acknowledged(event: &InputEvent, fsm: &mut Fsm, session: &mut Session) -> Outcome {
    if confirmed(event) {
        let next = if session.level.remaining_items() == 0 { FINISH } else { ITEM_COLLECTED };
        fsm.fire(next, session)?;
    }
    Ok(())
}
