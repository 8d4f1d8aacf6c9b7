//! Entity Module
//!
//! Players, monsters, pickups and projectiles as one closed set of kinds.
//!
//! ## Submodules
//! - [`entity`] - `Entity`, its kinds and the player state
//! - [`monster`] - species data and the shared monster state machine
//! - [`projectile`] - straight-flying projectiles

#[allow(clippy::module_inception)]
pub mod entity;
pub mod monster;
pub mod projectile;

pub use entity::{
    AMMO_BOX_AMOUNT, ARMOR_BONUS_AMOUNT, AmmoPouch, AmmoType, Entity, EntityId, EntityKind,
    HEALTH_PACK_AMOUNT, ItemEffect, ItemState, MonsterAttack, PLAYER_MAX_ARMOR, PLAYER_MAX_HEALTH,
    PlayerState,
};
pub use monster::{
    DamageOutcome, Monster, MonsterState, MovementMode, Species, SpeciesProfile, Steering,
    StrafeTimer, TacticalMemory,
};
pub use projectile::{ProjectileKind, ProjectileState};
