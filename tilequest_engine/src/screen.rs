//! Display layout and the camera that follows the player.
//!
//! The screen document fixes the window size, the tile size in pixels, and
//! how many tiles of the map are visible at once. Drawing itself belongs to
//! the renderer; this module only answers where things go.

use serde::Deserialize;
use tilequest_data::{CONFIG_DIR, SCREEN_DOCUMENT, Schema, screen_schema};

use crate::component::{Component, LoadError, LoadableComponent};
use crate::map::Position;
use crate::resource::ResourceManager;

/// Scrolls the map view in whole tiles so the player stays near the middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Camera {
    display_width: i64,
    display_height: i64,
}

impl Camera {
    pub fn new(display_width: usize, display_height: usize) -> Self {
        Self {
            display_width: to_i64(display_width),
            display_height: to_i64(display_height),
        }
    }

    /// Tile offset to add to map coordinates for a level of `level_size` (width, height).
    pub fn offset(&self, level_size: (usize, usize), player: Position) -> (i64, i64) {
        (
            axis_offset(self.display_width, to_i64(level_size.0), to_i64(player.x)),
            axis_offset(self.display_height, to_i64(level_size.1), to_i64(player.y)),
        )
    }
}

fn axis_offset(display: i64, size: i64, value: i64) -> i64 {
    let mid = display / 2;
    if value < mid {
        0
    } else if value < size - mid {
        mid - value
    } else {
        display - size
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Screen {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub map_display_width: usize,
    pub map_display_height: usize,
    #[serde(skip)]
    camera: Camera,
}

impl Screen {
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Where `pos` lands in the map view after the camera offset, if it is visible.
    pub fn view_position(&self, pos: Position, offset: (i64, i64)) -> Option<(i64, i64)> {
        let x = to_i64(pos.x) + offset.0;
        let y = to_i64(pos.y) + offset.1;
        let visible =
            (0..to_i64(self.map_display_width)).contains(&x) && (0..to_i64(self.map_display_height)).contains(&y);
        visible.then_some((x, y))
    }

    /// Pixel coordinates of the top-left corner of a view tile.
    pub fn to_pixels(&self, (x, y): (i64, i64)) -> (i64, i64) {
        (x * i64::from(self.tile_width), y * i64::from(self.tile_height))
    }
}

impl Component for Screen {
    const KIND: &'static str = "Screen";
    type Context = ();

    fn schema() -> Option<Schema> {
        Some(screen_schema())
    }

    fn post_process(&mut self, _manager: &mut ResourceManager, _ctx: &mut ()) -> Result<(), LoadError> {
        self.camera = Camera::new(self.map_display_width, self.map_display_height);
        Ok(())
    }
}

impl LoadableComponent for Screen {
    const PATH: &'static str = CONFIG_DIR;
    const LOCATION: Option<&'static str> = Some(SCREEN_DOCUMENT);
}
