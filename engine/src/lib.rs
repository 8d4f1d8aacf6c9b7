//! Sector Arena Engine Library
//!
//! Spatial world model and physics for a sector-based first-person shooter:
//! level geometry with a BSP spatial index, box-vs-wall collision, hitscan
//! raycasting and per-frame physics integration.
//!
//! # Modules
//!
//! - [`world`] - walls, sectors, BSP, level assembly and JSON loading
//! - [`physics`] - boxes, collision, raycasts and the physics step
//! - [`entity`] - players, monsters, items and projectiles
//! - [`config`] - tunable constants loaded from JSON
//! - [`error`] - construction and loading errors
//!
//! # Example
//!
//! ```ignore
//! use sector_arena_engine::config::EngineConfig;
//! use sector_arena_engine::entity::{Entity, EntityId};
//! use sector_arena_engine::physics::{PhysicsSystem, cast_ray};
//! use sector_arena_engine::world::Level;
//!
//! let config = EngineConfig::default();
//! let level = Level::test_room();
//! let mut entities = vec![Entity::player(EntityId(0), level.player_spawn(), &config.player)];
//!
//! let physics = PhysicsSystem::new(config.physics.clone());
//! physics.step(&mut entities, &level, 1.0 / 60.0);
//!
//! let eye = entities[0].position + glam::Vec3::Y * config.player.eye_height;
//! if let Some(hit) = cast_ray(eye, entities[0].forward(), 100.0, &level, &entities[1..]) {
//!     println!("hit {:?} at {:.2}", hit.target, hit.distance);
//! }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod physics;
pub mod world;

// Re-export the types most callers need
pub use config::EngineConfig;
pub use entity::{Entity, EntityId, EntityKind};
pub use error::{ConfigError, GeometryError, LevelError};
pub use physics::{AABB, PhysicsComponent, PhysicsSystem};
pub use world::{Level, LevelBuilder, Sector, Wall};
