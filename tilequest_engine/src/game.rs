//! The game session and its frame loop.
//!
//! A [`Game`] owns everything that lives for one play-through: the loaded
//! [`Session`] data and a [`Dispatcher`] holding the game's state machine.
//! Each frame drains input through the dispatcher, updates the level (item
//! pickup and monster moves happen only in the `main` state), then hands a
//! read-only [`Frame`] to the renderer.

use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use serde_json::json;

use crate::component::Loaded;
use crate::config::{Config, ConfigOptions};
use crate::dispatch::{DispatchError, Dispatcher};
use crate::fsm::{FsmError, StateMachine, Transition};
use crate::input::EventSource;
use crate::item::Item;
use crate::level::{Level, LevelOptions};
use crate::listeners;
use crate::player::Player;
use crate::questions::QuestionSet;
use crate::resource::ResourceManager;
use crate::screen::Screen;

/// State names of the game machine.
pub mod states {
    pub const SPLASH: &str = "splash";
    pub const MAIN: &str = "main";
    pub const QUESTION: &str = "question";
    pub const ITEM: &str = "item";
    pub const ENDSCREEN: &str = "endscreen";
    pub const EXIT: &str = "exit";

    /// Every state the player can leave by quitting.
    pub const PLAYING: [&str; 5] = [SPLASH, MAIN, QUESTION, ITEM, ENDSCREEN];
}

/// Transition names of the game machine.
pub mod transitions {
    pub const START: &str = "start";
    pub const POPUP_QUESTION: &str = "popup_question";
    pub const ANSWER: &str = "answer";
    pub const POPUP_ITEM: &str = "popup_item";
    pub const ITEM_COLLECTED: &str = "item_collected";
    pub const FINISH: &str = "finish";
    pub const EXIT: &str = "exit";
}

use states::{ENDSCREEN, EXIT, ITEM, MAIN, PLAYING, QUESTION, SPLASH};
use transitions::{ANSWER, FINISH, ITEM_COLLECTED, POPUP_ITEM, POPUP_QUESTION, START};

/// Everything listeners and callbacks act on.
#[derive(Debug)]
pub struct Session {
    pub config: Config,
    pub screen: Screen,
    pub level: Level,
    pub player: Player,
    /// Item picked up this frame, waiting for the `popup_item` transition.
    pub found_item: Option<Item>,
    /// Milliseconds timestamp of the current frame.
    pub now: u64,
}

impl Session {
    /// Put the player on the level's start tile.
    pub fn new(config: Config, screen: Screen, level: Level, mut player: Player) -> Self {
        player.position = level.map.player_start;
        Self {
            config,
            screen,
            level,
            player,
            found_item: None,
            now: 0,
        }
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.config.question_set
    }

    pub fn questions_mut(&mut self) -> &mut QuestionSet {
        &mut self.config.question_set
    }
}

/// Build the game's state machine with its callbacks attached.
///
/// # Errors
/// - only if the transition table itself is inconsistent
pub fn state_machine() -> Result<StateMachine<Session>, FsmError> {
    let mut table = vec![
        Transition::new(START, SPLASH, MAIN),
        Transition::new(POPUP_QUESTION, MAIN, QUESTION),
        Transition::new(ANSWER, QUESTION, MAIN),
        Transition::new(POPUP_ITEM, MAIN, ITEM),
        Transition::new(ITEM_COLLECTED, ITEM, MAIN),
        Transition::new(FINISH, ITEM, ENDSCREEN),
    ];
    table.extend(PLAYING.iter().map(|state| Transition::new(transitions::EXIT, *state, EXIT)));

    let mut fsm = StateMachine::new(SPLASH, table)?;
    fsm.on_before(POPUP_ITEM, take_found_item)?;
    fsm.on_after(ANSWER, settle_answer)?;
    Ok(fsm)
}

/// Moves the pending item into the inventory; no pending item vetoes the popup.
fn take_found_item(session: &mut Session) -> bool {
    match session.found_item.take() {
        Some(item) => {
            info!("player collected '{}'", item.title);
            session.player.collect(item);
            true
        },
        None => false,
    }
}

/// A wrong answer scatters the items again and empties the inventory.
fn settle_answer(session: &mut Session) -> bool {
    let correct = session.questions().is_correct();
    if !correct {
        info!("wrong answer, resetting items");
        session.level.reset_items(&mut session.player);
    }
    session.questions_mut().next();
    correct
}

/// Read-only snapshot handed to the renderer each frame.
#[derive(Debug)]
pub struct Frame<'a> {
    pub state: &'a str,
    pub config: &'a Config,
    pub screen: &'a Screen,
    pub level: &'a Level,
    pub player: &'a Player,
    /// Camera offset in tiles for the map view.
    pub camera_offset: (i64, i64),
    /// Question popup lines while a question is open.
    pub question: Option<Vec<String>>,
    /// Item popup lines while an item is open.
    pub item_message: Option<&'a [String]>,
    pub score: usize,
}

/// Draws frames. Pixel work lives entirely behind this trait.
pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>);
}

/// Source of frame timestamps in milliseconds.
pub trait Clock {
    fn now_ms(&mut self) -> u64;
}

/// Milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    started: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { started: Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now_ms(&mut self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Options for [`Game::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameOptions {
    /// Seed for question choice and placement; entropy when absent.
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub struct Game {
    dispatcher: Dispatcher<Session>,
    session: Session,
}

impl Game {
    /// Wire a session to the game machine and the standard listeners.
    ///
    /// # Errors
    /// - if the state machine cannot be built
    pub fn new(session: Session) -> Result<Self, FsmError> {
        let mut dispatcher = Dispatcher::new();
        dispatcher.attach(state_machine()?);
        listeners::register_all(&mut dispatcher);
        Ok(Self { dispatcher, session })
    }

    /// Load the configuration, screen, starting level and player, then build a game.
    ///
    /// # Errors
    /// - any of the documents is missing or invalid (missing art is not an error)
    pub fn load(manager: &mut ResourceManager, options: GameOptions) -> Result<Self> {
        let config = Loaded::<Config>::from_default_location(manager, &mut ConfigOptions { seed: options.seed })
            .into_result()
            .context("loading game configuration")?;
        let screen = Loaded::<Screen>::from_default_location(manager, &mut ())
            .into_result()
            .context("loading screen layout")?;
        let mut level_options = LevelOptions {
            popup_width: config.popup_box.char_width,
            seed: options.seed,
        };
        let level = Loaded::<Level>::from_location(manager, &config.start, &mut level_options)
            .into_result()
            .with_context(|| format!("loading level '{}'", config.start))?;
        let player = Loaded::<Player>::from_data(manager, json!({"image": config.player_image.args()}), &mut ())
            .into_result()
            .context("loading player")?;

        info!("game loaded, starting at level '{}'", config.start);
        Ok(Self::new(Session::new(config, screen, level, player))?)
    }

    /// Current state name of the game machine.
    pub fn state(&self) -> &str {
        self.dispatcher.fsm().map_or(EXIT, StateMachine::state)
    }

    pub fn is_over(&self) -> bool {
        self.state() == EXIT
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn dispatcher(&self) -> &Dispatcher<Session> {
        &self.dispatcher
    }

    /// One frame: dispatch pending input, update the level, render.
    ///
    /// # Errors
    /// - a listener or update fired a transition that is illegal in the current state
    pub fn step(
        &mut self,
        events: &mut impl EventSource,
        now: u64,
        renderer: &mut impl Renderer,
    ) -> Result<(), DispatchError> {
        self.session.now = now;
        self.dispatcher.handle_events(events, &mut self.session)?;
        self.update()?;
        renderer.render(&self.frame());
        Ok(())
    }

    /// Step frames until the game reaches the `exit` state. Returns the number of frames.
    ///
    /// # Errors
    /// - the first error from [`Game::step`]
    pub fn run(
        &mut self,
        events: &mut impl EventSource,
        clock: &mut impl Clock,
        renderer: &mut impl Renderer,
    ) -> Result<usize, DispatchError> {
        let mut frames = 0;
        while !self.is_over() {
            self.step(events, clock.now_ms(), renderer)?;
            frames += 1;
        }
        info!("game over after {frames} frames with score {}", self.session.player.score());
        Ok(frames)
    }

    pub fn frame(&self) -> Frame<'_> {
        let session = &self.session;
        let state = self.state();
        Frame {
            state,
            config: &session.config,
            screen: &session.screen,
            level: &session.level,
            player: &session.player,
            camera_offset: session
                .screen
                .camera()
                .offset(session.level.size(), session.player.position),
            question: (state == QUESTION).then(|| session.questions().display()),
            item_message: (state == ITEM)
                .then(|| session.player.current_item().map(Item::message_lines))
                .flatten(),
            score: session.player.score(),
        }
    }

    fn update(&mut self) -> Result<(), DispatchError> {
        let fsm = self.dispatcher.fsm_mut().ok_or(DispatchError::NotConfigured)?;
        let session = &mut self.session;
        if !fsm.is_state(MAIN) {
            return Ok(());
        }

        if let Some(item) = session.level.collect_item_at(session.player.position) {
            session.found_item = Some(item);
            fsm.fire(POPUP_ITEM, session)?;
        }

        let caught = session
            .level
            .move_monsters(session.now, session.config.monster_delay, session.player.position);
        if caught && fsm.can(POPUP_QUESTION) {
            fsm.fire(POPUP_QUESTION, session)?;
        }
        Ok(())
    }
}
