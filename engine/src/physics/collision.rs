//! Collision Detection
//!
//! Box-vs-wall and box-vs-box tests with push-out resolution.
//!
//! # Wall model
//!
//! Walls are 2D segments in the XZ plane. For wall tests a box is
//! approximated by a circle of radius `max(width, depth) / 2` around its
//! center, so a wall contact is a circle-vs-segment test: project the center
//! onto the segment (clamped to its endpoints), then compare the distance to
//! the radius.
//!
//! # Resolution order
//!
//! Resolution is a single pass per wall, in the level's wall build order. A box
//! wedged into a corner may end up in a slightly different spot depending on
//! that order; the result is deterministic but not iterated to convergence.

use glam::Vec3;

use super::aabb::AABB;
use crate::config::{PUSH_EPSILON, PhysicsConfig};
use crate::world::{Level, Wall};

/// Squared wall lengths below this are treated as degenerate.
const DEGENERATE_WALL_LENGTH_SQ: f32 = 1e-6;

/// Center-to-segment distances below this fall back to the wall normal.
const ON_SEGMENT_DISTANCE: f32 = 1e-6;

/// How deep a box sits inside a wall and which way to push it out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallContact {
    /// Radius minus center-to-segment distance
    pub penetration: f32,
    /// Unit push-out direction in the XZ plane
    pub normal: Vec3,
}

/// Circle-vs-segment test of a world-space box against a wall.
///
/// Returns `None` when there is no contact or the wall is degenerate.
pub fn check_aabb_wall_collision(aabb: &AABB, wall: &Wall) -> Option<WallContact> {
    let center = aabb.center();
    let size = aabb.size();
    let radius = size.x.max(size.z) * 0.5;

    let (x1, z1) = (wall.start().x, wall.start().z);
    let (dx, dz) = (wall.end().x - x1, wall.end().z - z1);
    let length_sq = dx * dx + dz * dz;
    if length_sq < DEGENERATE_WALL_LENGTH_SQ {
        return None;
    }

    let t = (((center.x - x1) * dx + (center.z - z1) * dz) / length_sq).clamp(0.0, 1.0);
    let offset_x = center.x - (x1 + t * dx);
    let offset_z = center.z - (z1 + t * dz);
    let distance = (offset_x * offset_x + offset_z * offset_z).sqrt();

    if distance >= radius {
        return None;
    }

    let normal = if distance > ON_SEGMENT_DISTANCE {
        Vec3::new(offset_x / distance, 0.0, offset_z / distance)
    } else {
        wall.normal()
    };

    Some(WallContact {
        penetration: radius - distance,
        normal,
    })
}

/// Pushes `position` out of `wall` if the local box `aabb` placed there
/// overlaps it. Returns `position` unchanged otherwise.
pub fn resolve_aabb_wall_collision(position: Vec3, aabb: &AABB, wall: &Wall) -> Vec3 {
    resolve_with_epsilon(position, aabb, wall, PUSH_EPSILON)
}

fn resolve_with_epsilon(position: Vec3, aabb: &AABB, wall: &Wall, epsilon: f32) -> Vec3 {
    match check_aabb_wall_collision(&aabb.translate(position), wall) {
        Some(contact) => position + contact.normal * (contact.penetration + epsilon),
        None => position,
    }
}

/// Box-vs-box overlap; touching counts.
pub fn check_aabb_collision(a: &AABB, b: &AABB) -> bool {
    a.intersects(b)
}

/// Moves a local box by `velocity * dt` and slides it along every wall it
/// ends up touching.
///
/// For each contact the position is pushed out and the part of the velocity
/// heading into the wall is removed, leaving the tangential part intact.
/// Returns `(new_position, new_velocity)`.
pub fn slide_collision<'a>(
    position: Vec3,
    velocity: Vec3,
    aabb: &AABB,
    walls: impl IntoIterator<Item = &'a Wall>,
    dt: f32,
) -> (Vec3, Vec3) {
    slide_with_epsilon(position, velocity, aabb, walls, dt, PUSH_EPSILON)
}

fn slide_with_epsilon<'a>(
    position: Vec3,
    mut velocity: Vec3,
    aabb: &AABB,
    walls: impl IntoIterator<Item = &'a Wall>,
    dt: f32,
    epsilon: f32,
) -> (Vec3, Vec3) {
    let mut new_position = position + velocity * dt;

    for wall in walls {
        let Some(contact) = check_aabb_wall_collision(&aabb.translate(new_position), wall) else {
            continue;
        };
        new_position += contact.normal * (contact.penetration + epsilon);

        let into_wall = velocity.dot(contact.normal);
        if into_wall < 0.0 {
            velocity -= contact.normal * into_wall;
        }
    }

    (new_position, velocity)
}

/// Stateless collision system that applies the primitives above to a whole
/// level, taking portals into account.
pub struct CollisionSystem;

impl CollisionSystem {
    /// Whether `wall` stops a body whose feet are at `feet_y`.
    ///
    /// Solid walls always block. A portal blocks when its far floor is more
    /// than `step_height` above the feet or its opening is shorter than the
    /// body.
    pub fn wall_blocks(
        level: &Level,
        wall: &Wall,
        feet_y: f32,
        body_height: f32,
        step_height: f32,
    ) -> bool {
        match level.portal_opening(wall) {
            None => true,
            Some((bottom, top)) => bottom - feet_y > step_height || top - bottom < body_height,
        }
    }

    /// Walls that block a local box whose origin sits at `position`, in build
    /// order.
    pub fn blocking_walls<'a>(
        level: &'a Level,
        position: Vec3,
        aabb: &AABB,
        config: &PhysicsConfig,
    ) -> impl Iterator<Item = &'a Wall> + 'a {
        let feet_y = position.y + aabb.min().y;
        let height = aabb.size().y;
        let step_height = config.step_height;
        level
            .walls()
            .iter()
            .filter(move |wall| Self::wall_blocks(level, wall, feet_y, height, step_height))
    }

    /// Slide move against every blocking wall in the level.
    pub fn slide(
        level: &Level,
        position: Vec3,
        velocity: Vec3,
        aabb: &AABB,
        dt: f32,
        config: &PhysicsConfig,
    ) -> (Vec3, Vec3) {
        let walls = Self::blocking_walls(level, position, aabb, config);
        slide_with_epsilon(position, velocity, aabb, walls, dt, config.push_epsilon)
    }

    /// Single-wall push-out against every blocking wall, in build order.
    ///
    /// Used to correct drift after something other than [`Self::slide`] has
    /// moved a body. Returns the corrected position.
    pub fn resolve_walls(level: &Level, position: Vec3, aabb: &AABB, config: &PhysicsConfig) -> Vec3 {
        Self::blocking_walls(level, position, aabb, config).fold(position, |pos, wall| {
            resolve_with_epsilon(pos, aabb, wall, config.push_epsilon)
        })
    }

    /// First wall (in build order) a world-space box touches, ignoring
    /// portals it fits through.
    pub fn touching_wall<'a>(
        level: &'a Level,
        world_aabb: &AABB,
        config: &PhysicsConfig,
    ) -> Option<&'a Wall> {
        let feet_y = world_aabb.min().y;
        let height = world_aabb.size().y;
        level.walls().iter().find(|wall| {
            Self::wall_blocks(level, wall, feet_y, height, config.step_height)
                && check_aabb_wall_collision(world_aabb, wall).is_some()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LevelBuilder, Sector, SectorId, WallId};

    fn east_wall() -> Wall {
        // Runs +Z at x = 5; normal points +X
        Wall::new(
            WallId(0),
            Vec3::new(5.0, 0.0, -5.0),
            Vec3::new(5.0, 0.0, 5.0),
            SectorId(0),
            None,
        )
    }

    fn body() -> AABB {
        AABB::from_center_size(Vec3::new(0.0, 0.5, 0.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_no_contact_when_far() {
        let aabb = body().translate(Vec3::new(0.0, 0.0, 0.0));
        assert!(check_aabb_wall_collision(&aabb, &east_wall()).is_none());
    }

    #[test]
    fn test_contact_penetration_and_normal() {
        let aabb = body().translate(Vec3::new(4.8, 0.0, 0.0));
        let contact = check_aabb_wall_collision(&aabb, &east_wall()).expect("should touch");
        assert!((contact.penetration - 0.3).abs() < 1e-5, "got {}", contact.penetration);
        assert!((contact.normal - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_center_on_segment_uses_wall_normal() {
        let aabb = body().translate(Vec3::new(5.0, 0.0, 0.0));
        let contact = check_aabb_wall_collision(&aabb, &east_wall()).unwrap();
        assert_eq!(contact.normal, east_wall().normal());
        assert!((contact.penetration - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_wall_never_collides() {
        let point = Wall::new(WallId(0), Vec3::ZERO, Vec3::ZERO, SectorId(0), None);
        assert!(check_aabb_wall_collision(&body(), &point).is_none());
    }

    #[test]
    fn test_resolve_separates() {
        let wall = east_wall();
        let start = Vec3::new(4.7, 0.0, 1.0);
        let resolved = resolve_aabb_wall_collision(start, &body(), &wall);
        assert!(resolved.x < start.x, "Should be pushed back towards the room");
        assert!(check_aabb_wall_collision(&body().translate(resolved), &wall).is_none());

        let clear = Vec3::new(0.0, 0.0, 0.0);
        assert_eq!(resolve_aabb_wall_collision(clear, &body(), &wall), clear);
    }

    #[test]
    fn test_slide_keeps_tangential_velocity() {
        let wall = east_wall();
        let velocity = Vec3::new(3.0, 0.0, 2.0);
        let (position, velocity) =
            slide_collision(Vec3::new(4.4, 0.0, 0.0), velocity, &body(), [&wall], 0.1);

        assert!(velocity.x.abs() < 1e-5, "Velocity into the wall should be removed, got {velocity}");
        assert!((velocity.z - 2.0).abs() < 1e-5, "Tangential velocity should be kept, got {velocity}");
        assert!(position.x <= 4.5 - PUSH_EPSILON + 1e-5);
        assert!((position.z - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_check_aabb_collision_delegates() {
        let a = body();
        assert!(check_aabb_collision(&a, &a.translate(Vec3::new(1.0, 0.0, 0.0))));
        assert!(!check_aabb_collision(&a, &a.translate(Vec3::new(1.5, 0.0, 0.0))));
    }

    #[test]
    fn test_portal_blocking_rules() {
        let mut builder = LevelBuilder::new("steps");
        let low = builder.add_sector(Sector::new(0.0, 4.0).unwrap());
        let step = builder.add_sector(Sector::new(0.4, 4.0).unwrap());
        let ledge = builder.add_sector(Sector::new(1.2, 4.0).unwrap());
        let duct = builder.add_sector(Sector::new(0.0, 1.0).unwrap());
        let to_step = builder.add_wall(Vec3::ZERO, Vec3::Z, low, Some(step)).unwrap();
        let to_ledge = builder.add_wall(Vec3::Z, Vec3::X, low, Some(ledge)).unwrap();
        let to_duct = builder.add_wall(Vec3::X, Vec3::ZERO, low, Some(duct)).unwrap();
        let level = builder.build();

        let blocks = |id| CollisionSystem::wall_blocks(&level, level.wall(id).unwrap(), 0.0, 1.75, 0.5);
        assert!(!blocks(to_step), "A 0.4 step should be climbable");
        assert!(blocks(to_ledge), "A 1.2 ledge should block");
        assert!(blocks(to_duct), "A 1.0 opening is too low for the player");
    }

    #[test]
    fn test_resolve_walls_in_room() {
        let level = crate::world::Level::test_room();
        let config = PhysicsConfig::default();
        let resolved =
            CollisionSystem::resolve_walls(&level, Vec3::new(4.9, 0.0, 0.0), &body(), &config);
        assert!(resolved.x < 4.5, "Body should be pushed inside the east wall, got {}", resolved.x);
    }
}
