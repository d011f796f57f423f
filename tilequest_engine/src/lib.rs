#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const TILEQUEST_VERSION: &str = env!("CARGO_PKG_VERSION");

// Engine modules
pub mod assets_path;
pub mod component;
pub mod dispatch;
pub mod fsm;
pub mod helpers;
pub mod input;
pub mod resource;
pub mod wrap;

// Game modules
pub mod config;
pub mod game;
pub mod item;
pub mod level;
pub mod listeners;
pub mod map;
pub mod monster;
pub mod player;
pub mod questions;
pub mod screen;

// Re-exports for convenience
pub use component::{Component, LoadError, LoadableComponent, Loaded};
pub use config::Config;
pub use dispatch::{DispatchError, Dispatcher};
pub use fsm::{FsmError, StateMachine, Transition};
pub use game::{Clock, Frame, Game, GameOptions, Renderer, Session, SystemClock};
pub use input::{EventSource, EventType, InputEvent, Key, ScriptedEvents};
pub use item::Item;
pub use level::Level;
pub use map::{Map, Position};
pub use monster::Monster;
pub use player::Player;
pub use questions::QuestionSet;
pub use resource::{Resource, ResourceError, ResourceManager};
pub use screen::Screen;
