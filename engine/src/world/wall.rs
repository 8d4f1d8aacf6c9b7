//! Wall segments
//!
//! A wall is a directed segment `start -> end` in the XZ plane, extruded
//! vertically between its sector's floor and ceiling. Y on the endpoints only
//! feeds texture mapping.
//!
//! The normal is computed once at construction as the right-hand
//! perpendicular of the direction, `(dz, 0, -dx)`. With the winding used by
//! level files this points away from the owning sector, and the owning
//! sector lies on the "front" side (`cross >= 0`) of the wall's line.

use glam::Vec3;

use super::sector::SectorId;
use crate::physics::types::{cross_xz, xz};

/// Index of a wall in its level, in build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallId(pub usize);

/// Determinants smaller than this are treated as parallel lines.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Where a ray crossed a wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    /// Ray parameter of the crossing (distance for a unit direction)
    pub distance: f32,
    /// World-space crossing point
    pub point: Vec3,
}

/// A wall segment bounding one sector, optionally a portal into another.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    id: WallId,
    start: Vec3,
    end: Vec3,
    sector: SectorId,
    other_sector: Option<SectorId>,
    normal: Vec3,
    /// Texture above a portal opening
    pub upper_texture: Option<String>,
    /// Texture of the solid span
    pub middle_texture: String,
    /// Texture below a portal opening
    pub lower_texture: Option<String>,
}

impl Wall {
    pub(crate) fn new(
        id: WallId,
        start: Vec3,
        end: Vec3,
        sector: SectorId,
        other_sector: Option<SectorId>,
    ) -> Self {
        let direction = end - start;
        // Zero for degenerate walls; collision treats those as absent
        let normal = Vec3::new(direction.z, 0.0, -direction.x).normalize_or_zero();
        let portal_texture = other_sector.map(|_| String::from("default_wall"));

        Self {
            id,
            start,
            end,
            sector,
            other_sector,
            normal,
            upper_texture: portal_texture.clone(),
            middle_texture: String::from("default_wall"),
            lower_texture: portal_texture,
        }
    }

    pub fn id(&self) -> WallId {
        self.id
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn end(&self) -> Vec3 {
        self.end
    }

    /// Sector this wall bounds.
    pub fn sector(&self) -> SectorId {
        self.sector
    }

    /// Sector on the far side when this wall is a portal.
    pub fn other_sector(&self) -> Option<SectorId> {
        self.other_sector
    }

    pub fn is_portal(&self) -> bool {
        self.other_sector.is_some()
    }

    /// Unit normal in the XZ plane pointing away from the owning sector.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Horizontal length of the segment.
    pub fn length(&self) -> f32 {
        (xz(self.end) - xz(self.start)).length()
    }

    pub fn midpoint(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    /// 2D cross product of `(x, z)` relative to this wall's line.
    ///
    /// Non-negative means the point is on the owning sector's side.
    pub fn side_of(&self, x: f32, z: f32) -> f32 {
        let origin = xz(self.start);
        cross_xz(xz(self.end) - origin, glam::Vec2::new(x, z) - origin)
    }

    /// Intersects a ray with this segment in the XZ plane.
    ///
    /// Solves the two-line parametric intersection; a hit needs the segment
    /// parameter in `[0, 1]` and a non-negative ray parameter. Parallel lines
    /// never hit. The returned distance is in units of `direction`.
    pub fn intersects_ray(&self, origin: Vec3, direction: Vec3) -> Option<WallHit> {
        let (x1, z1) = (self.start.x, self.start.z);
        let (x2, z2) = (self.end.x, self.end.z);
        let (x3, z3) = (origin.x, origin.z);
        let (dx, dz) = (direction.x, direction.z);

        let denom = (x1 - x2) * dz - (z1 - z2) * dx;
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = ((x1 - x3) * dz - (z1 - z3) * dx) / denom;
        let u = ((x1 - x2) * (z1 - z3) - (z1 - z2) * (x1 - x3)) / denom;

        if (0.0..=1.0).contains(&t) && u >= 0.0 {
            Some(WallHit {
                distance: u,
                point: origin + direction * u,
            })
        } else {
            None
        }
    }
}
