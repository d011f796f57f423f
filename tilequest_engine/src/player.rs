//! Player -- the character the person at the keyboard moves around
use serde::Deserialize;
use tilequest_data::{Schema, player_schema};

use crate::component::{AssetRef, Component, ImageAsset, Resolver};
use crate::item::Item;
use crate::map::{Direction, Map, Position};

#[derive(Debug, Clone, Deserialize)]
pub struct Player {
    pub image: AssetRef<ImageAsset>,
    #[serde(skip)]
    pub position: Position,
    #[serde(skip)]
    pub inventory: Vec<Item>,
    /// Index into `inventory` of the most recently collected item.
    #[serde(skip)]
    pub current_item: Option<usize>,
    /// True while the joystick rests at its center.
    #[serde(skip, default = "centered")]
    pub neutral: bool,
    #[serde(skip)]
    pub last_updated: Option<u64>,
}

fn centered() -> bool {
    true
}

impl Player {
    /// Move one tile in `direction` unless that leaves the map or hits a solid tile.
    ///
    /// Returns whether the player moved.
    pub fn step(&mut self, direction: Direction, map: &Map) -> bool {
        match map.neighbor(self.position, direction) {
            Some(next) if !map.is_solid(next) => {
                self.position = next;
                true
            },
            _ => false,
        }
    }

    pub fn collect(&mut self, item: Item) {
        self.inventory.push(item);
        self.current_item = Some(self.inventory.len() - 1);
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.current_item.and_then(|index| self.inventory.get(index))
    }

    pub fn clear_inventory(&mut self) {
        self.inventory.clear();
        self.current_item = None;
    }

    pub fn score(&self) -> usize {
        self.inventory.len()
    }
}

impl Component for Player {
    const KIND: &'static str = "Player";
    type Context = ();

    fn schema() -> Option<Schema> {
        Some(player_schema())
    }

    fn resolve(&mut self, resolver: &mut Resolver<'_>) {
        resolver.image("image", &mut self.image);
    }
}
