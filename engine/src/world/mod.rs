//! World Module
//!
//! Level geometry: walls, sectors, the BSP spatial index over them, level
//! assembly and JSON loading.
//!
//! ## Coordinates
//! Y is up. Walls live in the XZ plane and are extruded vertically between
//! their sector's floor and ceiling heights.

pub mod bsp;
pub mod level;
pub mod loader;
pub mod sector;
pub mod wall;

pub use bsp::{BspLeaf, BspNode, BspStats, BspTree, Partition, PartitionStrategy};
pub use level::{ItemSpawn, Level, LevelBuilder, MonsterSpawn};
pub use loader::{LevelFile, load_level, load_level_from_str};
pub use sector::{Sector, SectorId};
pub use wall::{Wall, WallHit, WallId};
