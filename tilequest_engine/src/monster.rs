//! Wandering monsters.
//!
//! Monsters chase the player one tile at a time. A monster considers moving
//! right, left, staying put, up, and down, in that order, skipping tiles that
//! are off the map, solid, or taken by another monster. It takes the option
//! closest to the player; the earlier option wins a tie.

use std::collections::HashSet;

use serde::Deserialize;
use tilequest_data::{Schema, monster_schema};

use crate::component::{AssetRef, Component, ImageAsset, Resolver};
use crate::map::{Direction, Map, Position};

#[derive(Debug, Clone, Deserialize)]
pub struct Monster {
    pub id: usize,
    pub image: AssetRef<ImageAsset>,
    #[serde(skip)]
    pub position: Position,
    /// Milliseconds timestamp of the last move.
    #[serde(skip)]
    pub last_moved_at: u64,
}

impl Monster {
    /// True once at least `delay` milliseconds have passed since the last move.
    pub fn is_due(&self, now: u64, delay: u64) -> bool {
        now > self.last_moved_at + delay
    }

    /// The tile this monster would step to, given the tiles held by other monsters.
    pub fn choose_move(&self, map: &Map, occupied: &HashSet<Position>, target: Position) -> Position {
        let here = self.position;
        let candidates = [
            map.neighbor(here, Direction::Right),
            map.neighbor(here, Direction::Left),
            Some(here),
            map.neighbor(here, Direction::Up),
            map.neighbor(here, Direction::Down),
        ];

        let mut best: Option<(usize, Position)> = None;
        for candidate in candidates.into_iter().flatten() {
            if map.is_solid(candidate) || occupied.contains(&candidate) {
                continue;
            }
            let distance = candidate.manhattan(target);
            if best.is_none_or(|(closest, _)| distance < closest) {
                best = Some((distance, candidate));
            }
        }
        best.map_or(here, |(_, pos)| pos)
    }
}

impl Component for Monster {
    const KIND: &'static str = "Monster";
    type Context = ();

    fn schema() -> Option<Schema> {
        Some(monster_schema())
    }

    fn resolve(&mut self, resolver: &mut Resolver<'_>) {
        resolver.image("image", &mut self.image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Loaded;
    use crate::resource::ResourceManager;
    use anyhow::Result;
    use serde_json::{Value, json};
    use tempfile::tempdir;

    fn open_map(width: usize, height: usize, solids: &[usize]) -> Result<Map> {
        let tiles: Vec<u32> = (0..width * height).map(|i| u32::from(solids.contains(&i))).collect();
        let data = json!({
            "solids": [1],
            "legend": {},
            "tiles": tiles,
            "dimensions": {"width": width, "height": height},
            "player_start": {"x": 0, "y": 0},
        });
        build(data)
    }

    fn build<C: Component<Context = ()>>(data: Value) -> Result<C> {
        let dir = tempdir()?;
        let mut manager = ResourceManager::new(dir.path());
        Ok(Loaded::<C>::from_data(&mut manager, data, &mut ()).into_result()?)
    }

    fn monster_at(x: usize, y: usize) -> Result<Monster> {
        let mut monster: Monster = build(json!({"id": 0, "image": "ghost.png"}))?;
        monster.position = Position::new(x, y);
        Ok(monster)
    }

    #[test]
    fn moves_toward_the_target() -> Result<()> {
        let map = open_map(5, 5, &[])?;
        let monster = monster_at(2, 2)?;
        let none = HashSet::new();
        assert_eq!(monster.choose_move(&map, &none, Position::new(4, 2)), Position::new(3, 2));
        assert_eq!(monster.choose_move(&map, &none, Position::new(2, 0)), Position::new(2, 1));
        assert_eq!(monster.choose_move(&map, &none, Position::new(2, 2)), Position::new(2, 2));
        Ok(())
    }

    #[test]
    fn ties_go_to_the_earlier_option() -> Result<()> {
        let map = open_map(5, 5, &[])?;
        let monster = monster_at(2, 2)?;
        // right and down are both one step closer to (4, 4)
        let choice = monster.choose_move(&map, &HashSet::new(), Position::new(4, 4));
        assert_eq!(choice, Position::new(3, 2));
        Ok(())
    }

    #[test]
    fn avoids_solids_and_other_monsters() -> Result<()> {
        // solid to the right of (2, 2)
        let map = open_map(5, 5, &[13])?;
        let monster = monster_at(2, 2)?;
        let occupied = HashSet::from([Position::new(2, 3)]);
        let choice = monster.choose_move(&map, &occupied, Position::new(4, 4));
        assert_eq!(choice, Position::new(2, 2));
        Ok(())
    }

    #[test]
    fn delay_gates_movement() -> Result<()> {
        let mut monster = monster_at(0, 0)?;
        monster.last_moved_at = 1000;
        assert!(!monster.is_due(1500, 500));
        assert!(monster.is_due(1501, 500));
        Ok(())
    }
}
