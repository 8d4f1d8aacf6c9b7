//! Raycasting
//!
//! Nearest-hit queries against level walls and entity boxes, for hitscan
//! weapons and line-of-sight checks.
//!
//! Walls are intersected in the XZ plane. A portal wall stops the ray only
//! when the crossing height falls outside its opening. Entities are
//! intersected through their world-space footprint.
//!
//! Candidates are compared with a strict `<`, so among hits at exactly the
//! same distance the first one seen wins: walls in build order, then entities
//! in iteration order.

use glam::Vec3;

use crate::entity::{Entity, EntityId};
use crate::world::{Level, WallId};

/// Squared direction lengths below this cannot be normalized.
const MIN_DIRECTION_LENGTH_SQ: f32 = 1e-12;

/// What a ray struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Wall(WallId),
    Entity(EntityId),
}

/// Nearest surface struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Distance from the origin along the normalized direction
    pub distance: f32,
    pub point: Vec3,
    /// Wall normal, or center-to-hit direction for entities (zero when the
    /// hit point is the center)
    pub normal: Vec3,
    pub target: HitTarget,
}

/// Casts a ray and returns the nearest wall or entity hit within
/// `max_distance`.
///
/// `direction` is normalized first; a zero direction hits nothing.
pub fn cast_ray<'a>(
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    level: &Level,
    entities: impl IntoIterator<Item = &'a Entity>,
) -> Option<RaycastHit> {
    if direction.length_squared() < MIN_DIRECTION_LENGTH_SQ {
        return None;
    }
    let direction = direction.normalize();
    let mut closest: Option<RaycastHit> = None;
    let nearer = |closest: &Option<RaycastHit>, distance: f32| {
        distance <= max_distance && closest.is_none_or(|hit| distance < hit.distance)
    };

    for wall in level.walls() {
        let Some(hit) = wall.intersects_ray(origin, direction) else {
            continue;
        };
        if !nearer(&closest, hit.distance) {
            continue;
        }
        if let Some((bottom, top)) = level.portal_opening(wall) {
            if (bottom..=top).contains(&hit.point.y) {
                continue;
            }
        }
        closest = Some(RaycastHit {
            distance: hit.distance,
            point: hit.point,
            normal: wall.normal(),
            target: HitTarget::Wall(wall.id()),
        });
    }

    for entity in entities {
        if !entity.is_active() {
            continue;
        }
        let footprint = entity.world_footprint();
        let Some((t_near, _)) = footprint.intersect_ray(origin, direction) else {
            continue;
        };
        if t_near < 0.0 || !nearer(&closest, t_near) {
            continue;
        }
        let point = origin + direction * t_near;
        closest = Some(RaycastHit {
            distance: t_near,
            point,
            normal: (point - footprint.center()).normalize_or_zero(),
            target: HitTarget::Entity(entity.id),
        });
    }

    closest
}

/// True when nothing in `level` or `entities` lies strictly between `start`
/// and `end`.
pub fn line_of_sight<'a>(
    start: Vec3,
    end: Vec3,
    level: &Level,
    entities: impl IntoIterator<Item = &'a Entity>,
) -> bool {
    let distance = start.distance(end);
    if distance == 0.0 {
        return true;
    }
    match cast_ray(start, end - start, distance, level, entities) {
        Some(hit) => hit.distance >= distance,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, Species};
    use crate::world::{LevelBuilder, Sector};

    const NO_ENTITIES: [&Entity; 0] = [];

    fn corridor_walls(distances: &[f32]) -> Level {
        let mut builder = LevelBuilder::new("corridor");
        let sector = builder.add_sector(Sector::new(0.0, 3.0).unwrap());
        for &x in distances {
            builder
                .add_wall(Vec3::new(x, 0.0, 1.0), Vec3::new(x, 0.0, -1.0), sector, None)
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_nearest_wall_wins_regardless_of_order() {
        for order in [[5.0, 10.0], [10.0, 5.0]] {
            let level = corridor_walls(&order);
            let hit = cast_ray(Vec3::ZERO, Vec3::X, 100.0, &level, NO_ENTITIES).expect("should hit");
            assert!((hit.distance - 5.0).abs() < 1e-5, "got {}", hit.distance);
            let near_wall = level.walls().iter().find(|w| w.start().x == 5.0).unwrap();
            assert_eq!(hit.normal, near_wall.normal());
            assert_eq!(hit.target, HitTarget::Wall(near_wall.id()));
        }
    }

    #[test]
    fn test_max_distance_limits_hits() {
        let level = corridor_walls(&[5.0]);
        assert!(cast_ray(Vec3::ZERO, Vec3::X, 4.0, &level, NO_ENTITIES).is_none());
        assert!(cast_ray(Vec3::ZERO, Vec3::X, 5.0, &level, NO_ENTITIES).is_some());
    }

    #[test]
    fn test_direction_is_normalized() {
        let level = corridor_walls(&[5.0]);
        let hit = cast_ray(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 100.0, &level, NO_ENTITIES).unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-5);
        assert!(cast_ray(Vec3::ZERO, Vec3::ZERO, 100.0, &level, NO_ENTITIES).is_none());
    }

    #[test]
    fn test_entity_hit_uses_world_footprint() {
        let level = corridor_walls(&[]);
        let imp = Entity::monster(EntityId(3), Species::Imp, Vec3::new(4.0, 0.0, 0.0));
        let hit = cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 50.0, &level, [&imp]).unwrap();
        assert_eq!(hit.target, HitTarget::Entity(EntityId(3)));
        assert!((hit.distance - 3.7).abs() < 1e-4, "got {}", hit.distance);
        assert!(hit.normal.x < 0.0, "Normal should face the shooter");
    }

    #[test]
    fn test_entity_behind_wall_is_hidden() {
        let level = corridor_walls(&[2.0]);
        let imp = Entity::monster(EntityId(1), Species::Imp, Vec3::new(4.0, 0.0, 0.0));
        let hit = cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 50.0, &level, [&imp]).unwrap();
        assert!(matches!(hit.target, HitTarget::Wall(_)));
    }

    #[test]
    fn test_line_of_sight_blocked_by_midpoint_wall() {
        let start = Vec3::ZERO;
        let end = Vec3::new(10.0, 0.0, 0.0);
        assert!(!line_of_sight(start, end, &corridor_walls(&[5.0]), NO_ENTITIES));
        assert!(line_of_sight(start, end, &corridor_walls(&[]), NO_ENTITIES));
        assert!(line_of_sight(start, start, &corridor_walls(&[0.0]), NO_ENTITIES));
    }

    #[test]
    fn test_ray_through_portal_opening() {
        let mut builder = LevelBuilder::new("window");
        let room = builder.add_sector(Sector::new(0.0, 3.0).unwrap());
        let sill = builder.add_sector(Sector::new(1.0, 2.0).unwrap());
        builder
            .add_wall(Vec3::new(5.0, 0.0, 1.0), Vec3::new(5.0, 0.0, -1.0), room, Some(sill))
            .unwrap();
        let level = builder.build();

        let through = Vec3::new(0.0, 1.5, 0.0);
        assert!(cast_ray(through, Vec3::X, 20.0, &level, NO_ENTITIES).is_none());
        let below = Vec3::new(0.0, 0.5, 0.0);
        assert!(cast_ray(below, Vec3::X, 20.0, &level, NO_ENTITIES).is_some());
    }
}
