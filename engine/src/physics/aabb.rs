//! Axis-aligned bounding box
//!
//! `AABB` is an immutable value type: every operation returns a new box. An
//! entity keeps its footprint in local space and translates it by its
//! position whenever a world-space box is needed.
//!
//! # Ray-AABB Intersection
//!
//! `intersect_ray` uses the slab method: it intersects the ray with each pair
//! of axis-aligned planes and keeps the latest entry and earliest exit.
//!
//! ```ignore
//! use sector_arena_engine::physics::AABB;
//! use glam::Vec3;
//!
//! let footprint = AABB::from_center_size(Vec3::new(0.0, 0.8, 0.0), Vec3::new(0.6, 1.6, 0.6));
//! let world = footprint.translate(Vec3::new(3.0, 0.0, -2.0));
//!
//! if let Some((t_near, _t_far)) = world.intersect_ray(Vec3::ZERO, Vec3::X) {
//!     println!("ray enters at t = {t_near}");
//! }
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Ray direction components closer to zero than this are replaced by a signed
/// epsilon before the slab division.
pub const RAY_DIRECTION_EPSILON: f32 = 1e-8;

/// Axis-aligned bounding box. Invariant: `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAabb", into = "RawAabb")]
pub struct AABB {
    min: Vec3,
    max: Vec3,
}

#[derive(Serialize, Deserialize)]
struct RawAabb {
    min: Vec3,
    max: Vec3,
}

impl TryFrom<RawAabb> for AABB {
    type Error = GeometryError;

    fn try_from(raw: RawAabb) -> Result<Self, Self::Error> {
        AABB::try_new(raw.min, raw.max)
    }
}

impl From<AABB> for RawAabb {
    fn from(aabb: AABB) -> Self {
        RawAabb {
            min: aabb.min,
            max: aabb.max,
        }
    }
}

impl AABB {
    /// Creates a box from its corners, rejecting inverted or non-finite input.
    pub fn try_new(min: Vec3, max: Vec3) -> Result<Self, GeometryError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(GeometryError::NonFiniteBox { min, max });
        }
        if min.cmpgt(max).any() {
            return Err(GeometryError::InvertedBox { min, max });
        }
        Ok(Self { min, max })
    }

    /// Creates a box from its corners.
    ///
    /// # Panics
    ///
    /// Panics if `min > max` on any axis or a corner is not finite. Use
    /// [`AABB::try_new`] for untrusted input.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        match Self::try_new(min, max) {
            Ok(aabb) => aabb,
            Err(err) => panic!("invalid AABB: {err}"),
        }
    }

    /// Creates a box centered on `center` with full extents `size`.
    pub fn try_from_center_size(center: Vec3, size: Vec3) -> Result<Self, GeometryError> {
        if size.cmplt(Vec3::ZERO).any() {
            return Err(GeometryError::NegativeSize(size));
        }
        let half = size * 0.5;
        Self::try_new(center - half, center + half)
    }

    /// Creates a box centered on `center` with full extents `size`.
    ///
    /// # Panics
    ///
    /// Panics if any component of `size` is negative.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        match Self::try_from_center_size(center, size) {
            Ok(aabb) => aabb,
            Err(err) => panic!("invalid AABB: {err}"),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full extents (width, height, depth).
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Overlap test on all three axes. Touching faces count as intersecting.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Inclusive point containment.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns this box shifted by `offset`.
    pub fn translate(&self, offset: Vec3) -> AABB {
        AABB {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grows every face outward by `amount`, or shrinks for negative amounts.
    ///
    /// Shrinking past zero extent collapses that axis onto the box center so
    /// the `min <= max` invariant holds.
    pub fn expand(&self, amount: f32) -> AABB {
        let grow = Vec3::splat(amount);
        let min = self.min - grow;
        let max = self.max + grow;
        let center = self.center();
        AABB {
            min: Vec3::select(min.cmpgt(max), center, min),
            max: Vec3::select(min.cmpgt(max), center, max),
        }
    }

    /// Slab-method ray intersection.
    ///
    /// Returns `Some((t_near, t_far))` with the entry and exit ray parameters
    /// when the ray's line crosses the box and the exit lies ahead of the
    /// origin. `t_near` is negative when the origin is inside the box; callers
    /// that only want entries ahead of the origin must check `t_near >= 0`.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<(f32, f32)> {
        let direction = Vec3::new(
            clamp_away_from_zero(direction.x),
            clamp_away_from_zero(direction.y),
            clamp_away_from_zero(direction.z),
        );

        let t1 = (self.min - origin) / direction;
        let t2 = (self.max - origin) / direction;

        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();

        if t_near > t_far || t_far < 0.0 {
            return None;
        }
        Some((t_near, t_far))
    }
}

#[inline]
fn clamp_away_from_zero(component: f32) -> f32 {
    if component.abs() < RAY_DIRECTION_EPSILON {
        RAY_DIRECTION_EPSILON.copysign(component)
    } else {
        component
    }
}
