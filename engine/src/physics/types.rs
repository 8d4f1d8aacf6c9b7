//! Physics type re-exports from glam
//!
//! Every geometric quantity in the engine is an `f32` `Vec3`. Only the X and Z
//! components carry weight for wall and sector queries; Y is height.

pub use glam::{Vec2, Vec3};

/// Projects a point onto the horizontal (XZ) plane.
#[inline]
pub fn xz(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// 2D cross product of `a` and `b` in the XZ plane.
#[inline]
pub fn cross_xz(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}
