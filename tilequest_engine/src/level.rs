//! Levels: a map plus the monsters and items scattered over it.
//!
//! Placement draws from the free tiles of the map (not solid, not the player
//! start) in shuffled order, so no two monsters and no two items start on the
//! same tile. Loading rejects a level without enough free tiles for either.

use std::collections::HashSet;

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{Value, json};
use tilequest_data::{MAPS_DIR, Schema, level_schema};

use crate::component::{
    CleanResult, Component, FieldCleaner, LoadError, Loaded, LoadableComponent, Rejection, Resolver,
};
use crate::helpers::{os_rng, raw_i64, raw_len, seeded_rng};
use crate::item::{DEFAULT_POPUP_WIDTH, Item};
use crate::map::{Map, Position, check_layout};
use crate::monster::Monster;
use crate::player::Player;
use crate::resource::ResourceManager;

/// The `monsters` section: every monster in a level shares one image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonsterSpec {
    pub image: String,
    pub number: usize,
}

/// Load options for [`Level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOptions {
    /// Popup width in characters, for item messages.
    pub popup_width: usize,
    /// Seed for placement; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for LevelOptions {
    fn default() -> Self {
        Self {
            popup_width: DEFAULT_POPUP_WIDTH,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Level {
    pub map: Map,
    #[serde(rename = "monsters")]
    pub monster_spec: MonsterSpec,
    pub items: Vec<Item>,
    #[serde(skip)]
    monsters: Vec<Monster>,
    /// Uncollected items: index into `items` and where it lies.
    #[serde(skip)]
    placements: Vec<(usize, Position)>,
    #[serde(skip, default = "os_rng")]
    rng: StdRng,
}

fn clean_monsters(monsters: &Value) -> CleanResult {
    if raw_i64(monsters, "number").is_some_and(|number| number >= 1) {
        Ok(())
    } else {
        Err(Rejection::because("you need at least 1 monster"))
    }
}

impl Level {
    pub fn width(&self) -> usize {
        self.map.width()
    }

    pub fn height(&self) -> usize {
        self.map.height()
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    pub fn monsters_mut(&mut self) -> &mut [Monster] {
        &mut self.monsters
    }

    /// Items still on the map, with their positions.
    pub fn placed_items(&self) -> impl Iterator<Item = (&Item, Position)> + '_ {
        self.placements
            .iter()
            .filter_map(|&(index, pos)| self.items.get(index).map(|item| (item, pos)))
    }

    pub fn remaining_items(&self) -> usize {
        self.placements.len()
    }

    pub fn item_at(&self, pos: Position) -> Option<&Item> {
        self.placed_items().find(|(_, at)| *at == pos).map(|(item, _)| item)
    }

    /// Take the item lying at `pos` off the map.
    pub fn collect_item_at(&mut self, pos: Position) -> Option<Item> {
        let slot = self.placements.iter().position(|(_, at)| *at == pos)?;
        let (index, _) = self.placements.remove(slot);
        self.items.get(index).cloned()
    }

    /// Empty the player's inventory and scatter every item again.
    pub fn reset_items(&mut self, player: &mut Player) {
        player.clear_inventory();
        let spots = self.shuffled_free_tiles();
        self.placements = (0..self.items.len()).zip(spots).collect();
    }

    /// Scatter every monster again.
    pub fn reset_monsters(&mut self) {
        let spots = self.shuffled_free_tiles();
        for (monster, spot) in self.monsters.iter_mut().zip(spots) {
            monster.position = spot;
            monster.last_moved_at = 0;
        }
    }

    /// Step every monster whose delay has elapsed toward `target`.
    ///
    /// Returns true if a monster that moved now stands on `target`.
    pub fn move_monsters(&mut self, now: u64, delay: u64, target: Position) -> bool {
        let mut occupied: HashSet<Position> = self.monsters.iter().map(|monster| monster.position).collect();
        let mut caught = false;
        for monster in &mut self.monsters {
            if !monster.is_due(now, delay) {
                continue;
            }
            monster.last_moved_at = now;
            occupied.remove(&monster.position);
            monster.position = monster.choose_move(&self.map, &occupied, target);
            occupied.insert(monster.position);
            caught |= monster.position == target;
        }
        caught
    }

    fn shuffled_free_tiles(&mut self) -> Vec<Position> {
        let mut spots = self.map.free_tiles();
        spots.shuffle(&mut self.rng);
        spots
    }

    fn build_monsters(&self, manager: &mut ResourceManager) -> Result<Vec<Monster>, LoadError> {
        (0..self.monster_spec.number)
            .map(|id| {
                let data = json!({"id": id, "image": self.monster_spec.image});
                Loaded::<Monster>::from_data(manager, data, &mut ())
                    .into_result()
                    .map_err(|source| LoadError::Nested {
                        field: "monsters",
                        source: Box::new(source),
                    })
            })
            .collect()
    }
}

impl Component for Level {
    const KIND: &'static str = "Level";
    const CLEANERS: &'static [FieldCleaner] =
        &[FieldCleaner::new("map", check_layout), FieldCleaner::new("monsters", clean_monsters)];
    type Context = LevelOptions;

    fn schema() -> Option<Schema> {
        Some(level_schema())
    }

    /// Placement must always find a spot: free tiles cover the monsters and the items.
    fn clean(raw: &Value) -> CleanResult {
        let map = &raw["map"];
        let solids = map["solids"].as_array().map_or(&[][..], Vec::as_slice);
        let width = usize::try_from(raw_i64(&map["dimensions"], "width").unwrap_or(0)).unwrap_or(0);
        let start = usize::try_from(raw_i64(&map["player_start"], "y").unwrap_or(0)).unwrap_or(0) * width
            + usize::try_from(raw_i64(&map["player_start"], "x").unwrap_or(0)).unwrap_or(0);
        let free = map["tiles"].as_array().map_or(0, |tiles| {
            tiles
                .iter()
                .enumerate()
                .filter(|(index, tile)| *index != start && !solids.contains(*tile))
                .count()
        });

        let monsters = usize::try_from(raw_i64(&raw["monsters"], "number").unwrap_or(0)).unwrap_or(0);
        if free < monsters {
            return Err(Rejection::because(format!("{monsters} monsters need {monsters} free tiles, found {free}")));
        }
        let items = raw_len(raw, "items");
        if free < items {
            return Err(Rejection::because(format!("{items} items need {items} free tiles, found {free}")));
        }
        Ok(())
    }

    fn resolve(&mut self, resolver: &mut Resolver<'_>) {
        self.map.resolve(resolver);
        for item in &mut self.items {
            item.resolve(resolver);
        }
    }

    fn post_process(&mut self, manager: &mut ResourceManager, options: &mut LevelOptions) -> Result<(), LoadError> {
        if options.seed.is_some() {
            self.rng = seeded_rng(options.seed);
        }
        self.map.post_process(manager, &mut ())?;
        for item in &mut self.items {
            item.post_process(manager, &mut options.popup_width)?;
        }
        self.monsters = self.build_monsters(manager)?;
        self.reset_monsters();
        let spots = self.shuffled_free_tiles();
        self.placements = (0..self.items.len()).zip(spots).collect();
        info!(
            "level placed {} monsters and {} items on a {}x{} map",
            self.monsters.len(),
            self.placements.len(),
            self.width(),
            self.height()
        );
        Ok(())
    }
}

impl LoadableComponent for Level {
    const PATH: &'static str = MAPS_DIR;
}
