//! Physics module
//!
//! Collision, raycasting and per-entity integration against sector-based
//! level geometry. Built from scratch on glam math, no external physics
//! library.
//!
//! # Unit System
//!
//! **1 unit = 1 meter**, Y up.
//!
//! - Distances in meters
//! - Velocities in m/s
//! - Accelerations in m/s²
//!
//! # Submodules
//!
//! - [`types`] - glam re-exports and XZ-plane helpers
//! - [`aabb`] - immutable axis-aligned boxes with slab-method ray intersection
//! - [`collision`] - box-vs-wall push-out, sliding and portal-aware blocking
//! - [`raycast`] - nearest-hit rays and line of sight
//! - [`body`] - per-entity velocity and force state
//! - [`system`] - the per-step driver tying the above to a level

pub mod aabb;
pub mod body;
pub mod collision;
pub mod raycast;
pub mod system;
pub mod types;

// Re-export commonly used types at the physics module level
pub use aabb::AABB;
pub use body::PhysicsComponent;
pub use collision::{
    CollisionSystem, WallContact, check_aabb_collision, check_aabb_wall_collision,
    resolve_aabb_wall_collision, slide_collision,
};
pub use raycast::{HitTarget, RaycastHit, cast_ray, line_of_sight};
pub use system::{MAX_SUBSTEPS, PhysicsSystem, ProjectileEvent, clamp_to_sector};
pub use types::{Vec2, Vec3};
