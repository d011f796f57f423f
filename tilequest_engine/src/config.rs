//! Game configuration.
//!
//! The configuration document names the starting level, the shared art, the
//! popup geometry, input timing, and the question set. The question set is a
//! separate document under `config/`; it is built while the configuration
//! loads and a configuration whose questions cannot be built is invalid.

use serde::Deserialize;
use serde_json::Value;
use tilequest_data::{CONFIG_DIR, CONFIG_DOCUMENT, Schema, config_schema};

use crate::component::{
    AssetRef, CleanResult, Component, DocumentAsset, FieldCleaner, FontAsset, ImageAsset, LoadError, Loaded,
    LoadableComponent, Rejection, Resolver,
};
use crate::helpers::raw_u64;
use crate::questions::{QuestionOptions, QuestionSet};
use crate::resource::{Resource, ResourceManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PopupBox {
    pub x: u32,
    pub y: u32,
    pub char_width: usize,
    pub char_height: usize,
}

/// Key repeat timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct KeypressRepeat {
    pub delay: u64,
    pub interval: u64,
}

/// Joystick repeat state: `delay` between repeated moves, `pressed` time accumulated since the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Joystick {
    pub delay: u64,
    pub pressed: u64,
}

/// Load options for [`Config`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOptions {
    /// Seed for question selection; entropy when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Level document to start with, under `maps/`.
    pub start: String,
    pub player_image: AssetRef<ImageAsset>,
    pub splash_image: AssetRef<ImageAsset>,
    pub endscreen_image: AssetRef<ImageAsset>,
    pub score_font: AssetRef<FontAsset>,
    /// Background music; playback is left to the host.
    pub music: Option<String>,
    pub popup_box: PopupBox,
    pub keypress_repeat: KeypressRepeat,
    pub questions: AssetRef<DocumentAsset>,
    pub monster_delay: u64,
    pub joystick: Joystick,
    #[serde(skip)]
    pub question_set: QuestionSet,
}

fn clean_popup_box(popup: &Value) -> CleanResult {
    let at_least_one = |key| raw_u64(popup, key).is_some_and(|value| value >= 1);
    if at_least_one("char_width") && at_least_one("char_height") {
        Ok(())
    } else {
        Err(Rejection::because("popup_box char_width and char_height must be at least 1"))
    }
}

impl Component for Config {
    const KIND: &'static str = "Config";
    const CLEANERS: &'static [FieldCleaner] = &[FieldCleaner::new("popup_box", clean_popup_box)];
    type Context = ConfigOptions;

    fn schema() -> Option<Schema> {
        Some(config_schema())
    }

    fn resolve(&mut self, resolver: &mut Resolver<'_>) {
        resolver.image("player_image", &mut self.player_image);
        resolver.image("splash_image", &mut self.splash_image);
        resolver.image("endscreen_image", &mut self.endscreen_image);
        resolver.font("score_font", &mut self.score_font);
        resolver.document("questions", CONFIG_DIR, &mut self.questions);
    }

    fn post_process(&mut self, manager: &mut ResourceManager, options: &mut ConfigOptions) -> Result<(), LoadError> {
        let nested = |source| LoadError::Nested {
            field: "questions",
            source: Box::new(source),
        };
        let Resource::Loaded(document) = self.questions.resource().clone() else {
            return Err(nested(LoadError::MissingDocument {
                kind: "Questions",
                path: CONFIG_DIR,
                location: self.questions.args().clone(),
            }));
        };
        let mut question_options = QuestionOptions {
            width: self.popup_box.char_width,
            seed: options.seed,
        };
        self.question_set = Loaded::<QuestionSet>::from_shared(manager, document, &mut question_options)
            .into_result()
            .map_err(nested)?;
        Ok(())
    }
}

impl LoadableComponent for Config {
    const PATH: &'static str = CONFIG_DIR;
    const LOCATION: Option<&'static str> = Some(CONFIG_DOCUMENT);
}
