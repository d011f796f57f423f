//! Collectible items.

use serde::Deserialize;
use tilequest_data::{Schema, item_schema};

use crate::component::{AssetRef, Component, ImageAsset, LoadError, Resolver};
use crate::resource::ResourceManager;
use crate::wrap::word_wrap;

/// Popup width used when nothing else is configured.
pub const DEFAULT_POPUP_WIDTH: usize = 20;

/// Closing line of every item popup.
pub const CONTINUE_PROMPT: &str = "Press \"Enter\" to continue";

#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub image: AssetRef<ImageAsset>,
    pub message: String,
    #[serde(skip)]
    lines: Vec<String>,
}

impl Item {
    /// The popup text: the wrapped message, a blank line, and the continue prompt.
    pub fn message_lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn wrap_message(&mut self, width: usize) {
        self.lines = word_wrap(&self.message, width);
        self.lines.push(String::new());
        self.lines.push(CONTINUE_PROMPT.to_string());
    }
}

impl Component for Item {
    const KIND: &'static str = "Item";
    /// Popup width in characters.
    type Context = usize;

    fn schema() -> Option<Schema> {
        Some(item_schema())
    }

    fn resolve(&mut self, resolver: &mut Resolver<'_>) {
        resolver.image("image", &mut self.image);
    }

    fn post_process(&mut self, _manager: &mut ResourceManager, width: &mut usize) -> Result<(), LoadError> {
        self.wrap_message(*width);
        Ok(())
    }
}
