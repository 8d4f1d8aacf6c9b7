//! Level assembly
//!
//! A [`LevelBuilder`] collects sectors, walls and spawn points. Calling
//! [`LevelBuilder::build`] consumes it and produces a [`Level`] whose
//! geometry and spatial index can no longer change, so a `&Level` can be
//! shared by every collision and raycast query in a frame.
//!
//! ```ignore
//! use sector_arena_engine::world::{LevelBuilder, Sector};
//! use glam::Vec3;
//!
//! let mut builder = LevelBuilder::new("Hall");
//! let hall = builder.add_sector(Sector::new(0.0, 3.0)?);
//! builder.add_wall(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 0.0, -5.0), hall, None)?;
//! // ... close the loop ...
//! let level = builder.build();
//! ```

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::bsp::{BspTree, PartitionStrategy};
use super::sector::{Sector, SectorId};
use super::wall::{Wall, WallId};
use crate::entity::Species;
use crate::error::LevelError;

/// Where a monster appears when the level starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterSpawn {
    pub position: Vec3,
    /// Species to spawn; the game picks one when absent
    #[serde(default)]
    pub species: Option<Species>,
}

/// Where an item appears, with the item type name used by the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpawn {
    pub position: Vec3,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Mutable level under construction.
#[derive(Debug, Clone)]
pub struct LevelBuilder {
    name: String,
    sectors: Vec<Sector>,
    walls: Vec<Wall>,
    player_spawn: Vec3,
    monster_spawns: Vec<MonsterSpawn>,
    item_spawns: Vec<ItemSpawn>,
    partition: PartitionStrategy,
}

impl LevelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sectors: Vec::new(),
            walls: Vec::new(),
            player_spawn: Vec3::ZERO,
            monster_spawns: Vec::new(),
            item_spawns: Vec::new(),
            partition: PartitionStrategy::default(),
        }
    }

    pub fn with_partition(mut self, partition: PartitionStrategy) -> Self {
        self.partition = partition;
        self
    }

    /// Adds a sector and returns its id. Walls passed to the sector before
    /// this call are discarded; walls are attached through [`Self::add_wall`].
    pub fn add_sector(&mut self, mut sector: Sector) -> SectorId {
        sector.clear_walls();
        let id = SectorId(self.sectors.len());
        self.sectors.push(sector);
        id
    }

    /// Adds a wall bounding `sector`, optionally a portal into `other_sector`.
    ///
    /// The wall is appended to the owning sector's wall list, so a sector's
    /// walls keep the order they were added to the level.
    pub fn add_wall(
        &mut self,
        start: Vec3,
        end: Vec3,
        sector: SectorId,
        other_sector: Option<SectorId>,
    ) -> Result<WallId, LevelError> {
        for referenced in std::iter::once(sector).chain(other_sector) {
            if referenced.0 >= self.sectors.len() {
                return Err(LevelError::UnknownSector {
                    wall: self.walls.len(),
                    sector: referenced.0,
                });
            }
        }
        Ok(self.attach_wall(start, end, sector, other_sector))
    }

    /// Appends a wall whose sector ids are already known to exist.
    fn attach_wall(
        &mut self,
        start: Vec3,
        end: Vec3,
        sector: SectorId,
        other_sector: Option<SectorId>,
    ) -> WallId {
        let id = WallId(self.walls.len());
        self.walls.push(Wall::new(id, start, end, sector, other_sector));
        self.sectors[sector.0].push_wall(id);
        id
    }

    /// Sets the solid-span texture of a wall already added.
    pub fn set_wall_texture(&mut self, wall: WallId, texture: impl Into<String>) {
        if let Some(wall) = self.walls.get_mut(wall.0) {
            wall.middle_texture = texture.into();
        }
    }

    pub fn set_player_spawn(&mut self, position: Vec3) {
        self.player_spawn = position;
    }

    pub fn add_monster_spawn(&mut self, spawn: MonsterSpawn) {
        self.monster_spawns.push(spawn);
    }

    pub fn add_item_spawn(&mut self, spawn: ItemSpawn) {
        self.item_spawns.push(spawn);
    }

    /// Builds the spatial index and freezes the level.
    pub fn build(self) -> Level {
        let bsp = BspTree::build(&self.walls, &self.sectors, self.partition);
        let stats = bsp.stats();
        info!(
            level = %self.name,
            sectors = self.sectors.len(),
            walls = self.walls.len(),
            bsp_splits = stats.splits,
            bsp_leaves = stats.leaves,
            partition = ?self.partition,
            "Level built"
        );

        Level {
            name: self.name,
            sectors: self.sectors,
            walls: self.walls,
            bsp,
            player_spawn: self.player_spawn,
            monster_spawns: self.monster_spawns,
            item_spawns: self.item_spawns,
            partition: self.partition,
        }
    }
}

/// Immutable level geometry with its spatial index and spawn points.
#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    sectors: Vec<Sector>,
    walls: Vec<Wall>,
    bsp: BspTree,
    player_spawn: Vec3,
    monster_spawns: Vec<MonsterSpawn>,
    item_spawns: Vec<ItemSpawn>,
    partition: PartitionStrategy,
}

static_assertions::assert_impl_all!(Level: Send, Sync);

impl Level {
    /// Single 10x10 room, floor 0, ceiling 2.5, player spawn at the center.
    pub fn test_room() -> Self {
        let mut builder = LevelBuilder::new("Test Level");
        let room = builder.add_sector(Sector::default());

        let corners = [
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(5.0, 0.0, -5.0),
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::new(-5.0, 0.0, 5.0),
        ];
        for (i, &start) in corners.iter().enumerate() {
            let end = corners[(i + 1) % corners.len()];
            builder.attach_wall(start, end, room, None);
        }

        builder.set_player_spawn(Vec3::new(0.0, 0.6, 0.0));
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// All walls in build order.
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(id.0)
    }

    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(id.0)
    }

    pub fn bsp(&self) -> &BspTree {
        &self.bsp
    }

    pub fn partition(&self) -> PartitionStrategy {
        self.partition
    }

    /// Sector owning `(x, z)` according to the spatial index.
    pub fn find_sector_id_at(&self, x: f32, z: f32) -> Option<SectorId> {
        self.bsp.find_sector_at(x, z)
    }

    /// Sector owning `(x, z)` according to the spatial index.
    pub fn find_sector_at(&self, x: f32, z: f32) -> Option<&Sector> {
        self.find_sector_id_at(x, z).and_then(|id| self.sector(id))
    }

    /// Walls that are not portals.
    pub fn solid_walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.iter().filter(|wall| !wall.is_portal())
    }

    /// XZ bounding rectangle of a sector, used for floor and ceiling quads.
    pub fn sector_bounds(&self, id: SectorId) -> Option<(Vec2, Vec2)> {
        self.sector(id)?.bounds(&self.walls)
    }

    /// Vertical span `(bottom, top)` through which a portal wall can be
    /// crossed: the higher floor up to the lower ceiling. `None` for solid
    /// walls.
    pub fn portal_opening(&self, wall: &Wall) -> Option<(f32, f32)> {
        let front = self.sector(wall.sector())?;
        let back = self.sector(wall.other_sector()?)?;
        Some((
            front.floor_height().max(back.floor_height()),
            front.ceiling_height().min(back.ceiling_height()),
        ))
    }

    pub fn player_spawn(&self) -> Vec3 {
        self.player_spawn
    }

    pub fn monster_spawns(&self) -> &[MonsterSpawn] {
        &self.monster_spawns
    }

    pub fn item_spawns(&self) -> &[ItemSpawn] {
        &self.item_spawns
    }
}
