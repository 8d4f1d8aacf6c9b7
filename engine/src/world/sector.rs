//! Sectors
//!
//! A sector is a convex floor/ceiling region bounded by walls. Its wall list
//! keeps the order walls were added to the level.

use glam::{Vec2, Vec3};

use super::wall::{Wall, WallId};
use crate::error::GeometryError;

/// Index of a sector in its level, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorId(pub usize);

/// A floor/ceiling region with its own height range and light level.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    floor_height: f32,
    ceiling_height: f32,
    light_level: f32,
    walls: Vec<WallId>,
    pub floor_texture: String,
    pub ceiling_texture: String,
}

/// Height defaults used by level files: floor 0, ceiling 2.5.
pub const DEFAULT_FLOOR_HEIGHT: f32 = 0.0;
pub const DEFAULT_CEILING_HEIGHT: f32 = 2.5;

impl Default for Sector {
    fn default() -> Self {
        Self {
            floor_height: DEFAULT_FLOOR_HEIGHT,
            ceiling_height: DEFAULT_CEILING_HEIGHT,
            light_level: 1.0,
            walls: Vec::new(),
            floor_texture: String::from("default_floor"),
            ceiling_texture: String::from("default_ceiling"),
        }
    }
}

impl Sector {
    /// Creates a sector with full brightness.
    ///
    /// Fails unless `ceiling_height > floor_height`.
    pub fn new(floor_height: f32, ceiling_height: f32) -> Result<Self, GeometryError> {
        if !(ceiling_height > floor_height) || !floor_height.is_finite() || !ceiling_height.is_finite() {
            return Err(GeometryError::InvalidSectorHeights {
                floor: floor_height,
                ceiling: ceiling_height,
            });
        }
        Ok(Self {
            floor_height,
            ceiling_height,
            light_level: 1.0,
            walls: Vec::new(),
            floor_texture: String::from("default_floor"),
            ceiling_texture: String::from("default_ceiling"),
        })
    }

    /// Sets the light level, which must lie in `[0, 1]`.
    pub fn with_light_level(mut self, light_level: f32) -> Result<Self, GeometryError> {
        if !(0.0..=1.0).contains(&light_level) {
            return Err(GeometryError::InvalidLightLevel(light_level));
        }
        self.light_level = light_level;
        Ok(self)
    }

    pub fn floor_height(&self) -> f32 {
        self.floor_height
    }

    pub fn ceiling_height(&self) -> f32 {
        self.ceiling_height
    }

    pub fn light_level(&self) -> f32 {
        self.light_level
    }

    /// Ceiling minus floor.
    pub fn height(&self) -> f32 {
        self.ceiling_height - self.floor_height
    }

    /// Bounding walls in the order they were added.
    pub fn walls(&self) -> &[WallId] {
        &self.walls
    }

    pub(crate) fn push_wall(&mut self, wall: WallId) {
        self.walls.push(wall);
    }

    pub(crate) fn clear_walls(&mut self) {
        self.walls.clear();
    }

    /// Even-odd point-in-polygon test over this sector's walls.
    ///
    /// Casts a horizontal ray towards +X from `(x, z)` and counts boundary
    /// crossings. Only meaningful when the walls form closed loops.
    pub fn contains_point(&self, walls: &[Wall], x: f32, z: f32) -> bool {
        let mut inside = false;
        for wall in self.walls.iter().filter_map(|id| walls.get(id.0)) {
            let (x1, z1) = (wall.start().x, wall.start().z);
            let (x2, z2) = (wall.end().x, wall.end().z);

            if (z1 > z) != (z2 > z) && x < (x2 - x1) * (z - z1) / (z2 - z1) + x1 {
                inside = !inside;
            }
        }
        inside
    }

    /// XZ bounding rectangle `(min, max)` of the sector's walls.
    pub fn bounds(&self, walls: &[Wall]) -> Option<(Vec2, Vec2)> {
        let mut points = self
            .walls
            .iter()
            .filter_map(|id| walls.get(id.0))
            .flat_map(|wall| [wall.start(), wall.end()])
            .map(|p: Vec3| Vec2::new(p.x, p.z));

        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}
