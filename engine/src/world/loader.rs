//! JSON level files
//!
//! ```json
//! {
//!   "name": "Two Rooms",
//!   "sectors": [{ "id": 0, "floor_height": 0.0, "ceiling_height": 3.0 }],
//!   "walls": [{ "start": [-5, 0, -5], "end": [5, 0, -5], "sector_id": 0 }],
//!   "player_spawn": [0.0, 0.6, 0.0],
//!   "monster_spawns": [[2.0, 0.0, 2.0], { "position": [3, 0, 3], "species": "imp" }],
//!   "item_spawns": [{ "position": [1, 0, 1], "type": "health" }]
//! }
//! ```
//!
//! Missing fields take the defaults documented on each definition. A wall that
//! names a sector id absent from `sectors` is rejected.

use std::collections::HashMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::bsp::PartitionStrategy;
use super::level::{ItemSpawn, Level, LevelBuilder, MonsterSpawn};
use super::sector::{DEFAULT_CEILING_HEIGHT, DEFAULT_FLOOR_HEIGHT, Sector, SectorId};
use crate::entity::Species;
use crate::error::LevelError;

fn default_name() -> String {
    String::from("Untitled")
}

fn default_floor() -> f32 {
    DEFAULT_FLOOR_HEIGHT
}

fn default_ceiling() -> f32 {
    DEFAULT_CEILING_HEIGHT
}

fn default_light() -> f32 {
    1.0
}

fn default_floor_texture() -> String {
    String::from("default_floor")
}

fn default_ceiling_texture() -> String {
    String::from("default_ceiling")
}

fn default_wall_texture() -> String {
    String::from("default_wall")
}

/// Top-level level document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFile {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub sectors: Vec<SectorDef>,
    #[serde(default)]
    pub walls: Vec<WallDef>,
    #[serde(default)]
    pub player_spawn: Option<Vec3>,
    #[serde(default)]
    pub monster_spawns: Vec<MonsterSpawnDef>,
    #[serde(default)]
    pub item_spawns: Vec<ItemSpawn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorDef {
    pub id: u32,
    #[serde(default = "default_floor")]
    pub floor_height: f32,
    #[serde(default = "default_ceiling")]
    pub ceiling_height: f32,
    #[serde(default = "default_light")]
    pub light_level: f32,
    #[serde(default = "default_floor_texture")]
    pub floor_texture: String,
    #[serde(default = "default_ceiling_texture")]
    pub ceiling_texture: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallDef {
    pub start: Vec3,
    pub end: Vec3,
    pub sector_id: u32,
    #[serde(default)]
    pub other_sector_id: Option<u32>,
    #[serde(default = "default_wall_texture")]
    pub texture: String,
}

/// A monster spawn is either a bare position or a position with a species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonsterSpawnDef {
    Position(Vec3),
    Detailed {
        position: Vec3,
        #[serde(default)]
        species: Option<Species>,
    },
}

impl From<MonsterSpawnDef> for MonsterSpawn {
    fn from(def: MonsterSpawnDef) -> Self {
        match def {
            MonsterSpawnDef::Position(position) => MonsterSpawn {
                position,
                species: None,
            },
            MonsterSpawnDef::Detailed { position, species } => MonsterSpawn { position, species },
        }
    }
}

impl LevelFile {
    /// Validates the document and builds the level.
    pub fn into_level(self, partition: PartitionStrategy) -> Result<Level, LevelError> {
        let mut builder = LevelBuilder::new(self.name).with_partition(partition);
        let mut ids: HashMap<u32, SectorId> = HashMap::with_capacity(self.sectors.len());

        for def in self.sectors {
            if ids.contains_key(&def.id) {
                return Err(LevelError::DuplicateSector(def.id));
            }
            let mut sector =
                Sector::new(def.floor_height, def.ceiling_height)?.with_light_level(def.light_level)?;
            sector.floor_texture = def.floor_texture;
            sector.ceiling_texture = def.ceiling_texture;
            ids.insert(def.id, builder.add_sector(sector));
        }

        for (index, def) in self.walls.into_iter().enumerate() {
            let resolve = |id: u32| {
                ids.get(&id).copied().ok_or(LevelError::UnknownSector {
                    wall: index,
                    sector: id as usize,
                })
            };
            let sector = resolve(def.sector_id)?;
            let other = def.other_sector_id.map(resolve).transpose()?;

            let wall = builder.add_wall(def.start, def.end, sector, other)?;
            builder.set_wall_texture(wall, def.texture);
        }

        if let Some(spawn) = self.player_spawn {
            builder.set_player_spawn(spawn);
        }
        for spawn in self.monster_spawns {
            builder.add_monster_spawn(spawn.into());
        }
        for spawn in self.item_spawns {
            builder.add_item_spawn(spawn);
        }

        Ok(builder.build())
    }
}

/// Parses and builds a level from JSON text.
pub fn load_level_from_str(json: &str, partition: PartitionStrategy) -> Result<Level, LevelError> {
    let file: LevelFile = serde_json::from_str(json)?;
    file.into_level(partition)
}

/// Reads, parses and builds a level file.
pub fn load_level(path: impl AsRef<Path>, partition: PartitionStrategy) -> Result<Level, LevelError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let level = load_level_from_str(&text, partition)?;
    info!(path = %path.display(), level = level.name(), "Loaded level");
    Ok(level)
}
