//! Tile maps.
//!
//! A map is a flat, row-major grid of tile values. The legend turns tile
//! values into images; the `solids` list names the values that block
//! movement. Solidity is derived once per tile after loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tilequest_data::{Schema, map_schema};

use crate::component::{CleanResult, Component, ImageAsset, AssetRef, LoadError, Rejection, Resolver};
use crate::helpers::{raw_i64, raw_len, raw_u64};
use crate::resource::ResourceManager;

pub type TileId = u32;

/// A tile coordinate. `x` grows to the right, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Sum of the horizontal and vertical distances.
    pub fn manhattan(self, other: Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Map {
    pub solids: Vec<TileId>,
    pub legend: BTreeMap<TileId, AssetRef<ImageAsset>>,
    pub tiles: Vec<TileId>,
    pub dimensions: Dimensions,
    pub player_start: Position,
    #[serde(skip)]
    tile_solids: Vec<bool>,
}

impl Map {
    pub fn width(&self) -> usize {
        self.dimensions.width
    }

    pub fn height(&self) -> usize {
        self.dimensions.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width() && pos.y < self.height()
    }

    /// Row-major index of `pos`, if it lies on the map.
    pub fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos).then(|| pos.y * self.width() + pos.x)
    }

    pub fn tile_at(&self, pos: Position) -> Option<TileId> {
        self.index(pos).and_then(|index| self.tiles.get(index).copied())
    }

    /// The legend entry for the tile at `pos`.
    pub fn tile_image(&self, pos: Position) -> Option<&AssetRef<ImageAsset>> {
        self.tile_at(pos).and_then(|tile| self.legend.get(&tile))
    }

    /// Positions off the map count as solid.
    pub fn is_solid(&self, pos: Position) -> bool {
        self.index(pos)
            .and_then(|index| self.tile_solids.get(index).copied())
            .unwrap_or(true)
    }

    pub fn tile_solids(&self) -> &[bool] {
        &self.tile_solids
    }

    /// The neighbor of `pos` in `direction`, if it lies on the map.
    pub fn neighbor(&self, pos: Position, direction: Direction) -> Option<Position> {
        let next = match direction {
            Direction::Up => Position::new(pos.x, pos.y.checked_sub(1)?),
            Direction::Down => Position::new(pos.x, pos.y + 1),
            Direction::Left => Position::new(pos.x.checked_sub(1)?, pos.y),
            Direction::Right => Position::new(pos.x + 1, pos.y),
        };
        self.contains(next).then_some(next)
    }

    /// Every non-solid tile except the player start, in row-major order.
    pub fn free_tiles(&self) -> Vec<Position> {
        (0..self.height())
            .flat_map(|y| (0..self.width()).map(move |x| Position::new(x, y)))
            .filter(|pos| *pos != self.player_start && !self.is_solid(*pos))
            .collect()
    }

    pub(crate) fn derive_solids(&mut self) {
        self.tile_solids = self.tiles.iter().map(|tile| self.solids.contains(tile)).collect();
    }
}

/// Layout rules over a raw `map` section: tile count and player start.
pub(crate) fn check_layout(map: &Value) -> CleanResult {
    let dimensions = &map["dimensions"];
    let (Some(width), Some(height)) = (raw_u64(dimensions, "width"), raw_u64(dimensions, "height")) else {
        return Err(Rejection::because("map dimensions must be non-negative integers"));
    };
    if width.checked_mul(height) != Some(raw_len(map, "tiles") as u64) {
        return Err(Rejection::because("number of tiles must equal width * height"));
    }

    let start = &map["player_start"];
    let in_bounds = |value: Option<i64>, limit: u64| value.is_some_and(|v| v >= 0 && v.unsigned_abs() < limit);
    if !in_bounds(raw_i64(start, "x"), width) || !in_bounds(raw_i64(start, "y"), height) {
        return Err(Rejection::because("the player_start x or y is out of bounds"));
    }
    Ok(())
}

impl Component for Map {
    const KIND: &'static str = "Map";
    type Context = ();

    fn schema() -> Option<Schema> {
        Some(map_schema())
    }

    fn clean(raw: &Value) -> CleanResult {
        check_layout(raw)
    }

    fn resolve(&mut self, resolver: &mut Resolver<'_>) {
        resolver.images("legend", &mut self.legend);
    }

    fn post_process(&mut self, _manager: &mut ResourceManager, _ctx: &mut ()) -> Result<(), LoadError> {
        self.derive_solids();
        Ok(())
    }
}
