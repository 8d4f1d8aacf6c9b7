//! Physics System
//!
//! Advances every entity by one step against a frozen [`Level`].
//!
//! # Per-body step
//!
//! 1. Integrate velocity ([`PhysicsComponent::integrate`]).
//! 2. Move by `velocity * dt`, sliding along blocking walls.
//! 3. Ground/ceiling clamp against the sector under the new position.
//!
//! Bodies never read each other's state during a step, so
//! [`PhysicsSystem::step_parallel`] can spread them over the rayon pool with
//! identical results. Projectiles run afterwards, one at a time, because they
//! test against other entities.
//!
//! # Example
//!
//! ```ignore
//! let physics = PhysicsSystem::new(config.physics.clone());
//! let events = physics.step_chunked(&mut entities, &level, frame_dt);
//! PhysicsSystem::apply_projectile_damage(&mut entities, &events);
//! ```

use glam::Vec3;
use rayon::prelude::*;
use tracing::trace;

use super::aabb::AABB;
use super::body::PhysicsComponent;
use super::collision::{CollisionSystem, check_aabb_collision};
use super::raycast::{HitTarget, cast_ray};
use crate::config::PhysicsConfig;
use crate::entity::{Entity, EntityId, EntityKind};
use crate::world::{Level, WallId};

/// Most sub-steps a single [`PhysicsSystem::step_chunked`] call runs.
pub const MAX_SUBSTEPS: u32 = 32;

/// What happened to a projectile during a step.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileEvent {
    HitWall {
        projectile: EntityId,
        owner: Option<EntityId>,
        wall: Option<WallId>,
        point: Vec3,
    },
    HitEntity {
        projectile: EntityId,
        owner: Option<EntityId>,
        target: EntityId,
        damage: f32,
        point: Vec3,
    },
    Expired {
        projectile: EntityId,
    },
}

/// Steps entity physics with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct PhysicsSystem {
    config: PhysicsConfig,
}

impl PhysicsSystem {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// One step of `dt` seconds for every active entity.
    pub fn step(&self, entities: &mut [Entity], level: &Level, dt: f32) -> Vec<ProjectileEvent> {
        for entity in entities.iter_mut() {
            self.step_entity(entity, level, dt);
        }
        self.step_projectiles(entities, level, dt)
    }

    /// Same as [`Self::step`] with the body updates run on the rayon pool.
    pub fn step_parallel(&self, entities: &mut [Entity], level: &Level, dt: f32) -> Vec<ProjectileEvent> {
        entities
            .par_iter_mut()
            .for_each(|entity| self.step_entity(entity, level, dt));
        self.step_projectiles(entities, level, dt)
    }

    /// Splits `frame_dt` into equal sub-steps no longer than `max_substep`.
    ///
    /// The frame is first cut to `max_frame_time`. Negative or non-finite
    /// frame times simulate nothing. At most [`MAX_SUBSTEPS`] sub-steps run.
    pub fn step_chunked(&self, entities: &mut [Entity], level: &Level, frame_dt: f32) -> Vec<ProjectileEvent> {
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.min(self.config.max_frame_time).max(0.0)
        } else {
            0.0
        };
        if frame_dt <= 0.0 {
            return Vec::new();
        }
        if !(self.config.max_substep > 0.0) {
            return self.step(entities, level, frame_dt);
        }

        let substeps = ((frame_dt / self.config.max_substep).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        let dt = frame_dt / substeps as f32;
        let mut events = Vec::new();
        for _ in 0..substeps {
            events.extend(self.step(entities, level, dt));
        }
        trace!(frame_dt, substeps, events = events.len(), "Chunked physics step");
        events
    }

    /// Integrate, slide and clamp one entity with a physics body.
    ///
    /// Inactive entities and entities without a body are left alone.
    pub fn step_entity(&self, entity: &mut Entity, level: &Level, dt: f32) {
        if !entity.is_active() {
            return;
        }
        let footprint = entity.footprint;
        let Some(body) = entity.physics.as_mut() else {
            return;
        };

        body.integrate(dt, &self.config);
        let (position, velocity) =
            CollisionSystem::slide(level, entity.position, body.velocity, &footprint, dt, &self.config);
        entity.position = position;
        body.velocity = velocity;

        clamp_to_sector(level, &mut entity.position, body, &footprint);
        trace!(
            entity = entity.id.0,
            x = entity.position.x,
            y = entity.position.y,
            z = entity.position.z,
            on_ground = body.on_ground,
            "Physics step"
        );
    }

    fn step_projectiles(&self, entities: &mut [Entity], level: &Level, dt: f32) -> Vec<ProjectileEvent> {
        let mut events = Vec::new();
        for index in 0..entities.len() {
            let Some((position, hit)) = self.advance_projectile(index, entities, level, dt) else {
                continue;
            };

            let projectile = &mut entities[index];
            projectile.position = position;
            let expired = match &mut projectile.kind {
                EntityKind::Projectile(state) => state.tick(dt),
                _ => false,
            };

            let event = hit.or_else(|| expired.then_some(ProjectileEvent::Expired { projectile: projectile.id }));
            if let Some(event) = event {
                projectile.destroy();
                events.push(event);
            }
        }
        events
    }

    /// Works out where projectile `index` ends up and what it struck.
    ///
    /// Returns `None` for entities that are not active projectiles.
    fn advance_projectile(
        &self,
        index: usize,
        entities: &[Entity],
        level: &Level,
        dt: f32,
    ) -> Option<(Vec3, Option<ProjectileEvent>)> {
        let entity = &entities[index];
        if !entity.is_active() {
            return None;
        }
        let EntityKind::Projectile(state) = &entity.kind else {
            return None;
        };
        let id = entity.id;
        let travel = state.speed * dt;
        let next = entity.position + state.velocity() * dt;

        let no_entities: [&Entity; 0] = [];
        if let Some(hit) = cast_ray(entity.position, state.direction, travel, level, no_entities) {
            let wall = match hit.target {
                HitTarget::Wall(wall) => Some(wall),
                HitTarget::Entity(_) => None,
            };
            let event = ProjectileEvent::HitWall {
                projectile: id,
                owner: state.owner,
                wall,
                point: hit.point,
            };
            return Some((hit.point, Some(event)));
        }

        let world = entity.footprint.translate(next);
        if let Some(wall) = CollisionSystem::touching_wall(level, &world, &self.config) {
            let event = ProjectileEvent::HitWall {
                projectile: id,
                owner: state.owner,
                wall: Some(wall.id()),
                point: next,
            };
            return Some((next, Some(event)));
        }

        let victim = entities.iter().find(|other| {
            other.id != id
                && Some(other.id) != state.owner
                && other.is_active()
                && other.solid
                && check_aabb_collision(&world, &other.world_footprint())
        });
        let event = victim.map(|victim| ProjectileEvent::HitEntity {
            projectile: id,
            owner: state.owner,
            target: victim.id,
            damage: state.damage,
            point: next,
        });
        Some((next, event))
    }

    /// Deals the damage of every entity hit in `events`, credited to the
    /// projectile's owner.
    pub fn apply_projectile_damage(entities: &mut [Entity], events: &[ProjectileEvent]) {
        for event in events {
            let ProjectileEvent::HitEntity {
                owner,
                target,
                damage,
                ..
            } = event
            else {
                continue;
            };
            if let Some(entity) = entities.iter_mut().find(|entity| entity.id == *target) {
                entity.take_damage(*damage, *owner);
            }
        }
    }
}

/// Ground and ceiling clamp against the sector under `position`.
///
/// Feet at or below the floor snap to it and land the body. A footprint top
/// at or above the ceiling is pushed down to touch it. Both can apply in the
/// same step. Without a sector underneath the body is airborne and unclamped.
pub fn clamp_to_sector(level: &Level, position: &mut Vec3, body: &mut PhysicsComponent, footprint: &AABB) {
    let Some(sector) = level.find_sector_at(position.x, position.z) else {
        body.on_ground = false;
        return;
    };

    if position.y <= sector.floor_height() {
        position.y = sector.floor_height();
        body.velocity.y = 0.0;
        body.on_ground = true;
    } else {
        body.on_ground = false;
    }

    let top = footprint.max().y;
    if position.y + top >= sector.ceiling_height() {
        position.y = sector.ceiling_height() - top;
        body.velocity.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::entity::{ProjectileKind, Species};
    use crate::world::LevelBuilder;

    fn player_at(position: Vec3) -> Entity {
        Entity::player(EntityId(0), position, &PlayerConfig::default())
    }

    #[test]
    fn test_lands_on_floor() {
        let level = Level::test_room();
        let physics = PhysicsSystem::default();
        let mut entities = vec![player_at(Vec3::new(0.0, -1.0, 0.0))];
        physics.step(&mut entities, &level, 1.0 / 60.0);

        let body = entities[0].physics.as_ref().unwrap();
        assert_eq!(entities[0].position.y, 0.0);
        assert_eq!(body.velocity.y, 0.0);
        assert!(body.on_ground);
    }

    #[test]
    fn test_ceiling_pushes_down() {
        let level = Level::test_room();
        let physics = PhysicsSystem::default();
        let mut entities = vec![player_at(Vec3::new(0.0, 1.0, 0.0))];
        entities[0].physics.as_mut().unwrap().velocity.y = 10.0;
        physics.step(&mut entities, &level, 0.05);

        assert!((entities[0].position.y - 0.75).abs() < 1e-5, "got {}", entities[0].position.y);
        assert_eq!(entities[0].physics.as_ref().unwrap().velocity.y, 0.0);
    }

    #[test]
    fn test_walls_stop_bodies() {
        let level = Level::test_room();
        let physics = PhysicsSystem::default();
        let mut entities = vec![player_at(Vec3::new(4.0, 0.0, 0.0))];
        for _ in 0..120 {
            entities[0].physics.as_mut().unwrap().velocity.x = 5.0;
            physics.step(&mut entities, &level, 1.0 / 60.0);
        }
        assert!(entities[0].position.x < 4.7 + 1e-3, "got {}", entities[0].position.x);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let level = Level::test_room();
        let physics = PhysicsSystem::default();
        let make = || {
            (0..16)
                .map(|i| {
                    let mut imp = Entity::monster(EntityId(i), Species::Imp, Vec3::new(-4.0 + i as f32 * 0.5, 1.0, 0.0));
                    imp.physics.as_mut().unwrap().velocity = Vec3::new(3.0, 0.0, -2.0);
                    imp
                })
                .collect::<Vec<_>>()
        };
        let mut serial = make();
        let mut parallel = make();
        for _ in 0..30 {
            physics.step(&mut serial, &level, 1.0 / 60.0);
            physics.step_parallel(&mut parallel, &level, 1.0 / 60.0);
        }
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_chunked_step_splits_frame() {
        let level = LevelBuilder::new("void").build();
        let physics = PhysicsSystem::default();
        let mut entities = vec![player_at(Vec3::ZERO)];
        physics.step_chunked(&mut entities, &level, 0.2);

        let velocity = entities[0].physics.as_ref().unwrap().velocity.y;
        assert!((velocity + 4.0).abs() < 1e-4, "got {velocity}");
    }

    #[test]
    fn test_chunked_step_caps_long_frames() {
        let level = LevelBuilder::new("void").build();
        let physics = PhysicsSystem::default();
        let mut entities = vec![player_at(Vec3::ZERO)];
        physics.step_chunked(&mut entities, &level, 5.0e6);

        // Cut to the 0.25 s frame cap: four sub-steps of 0.0625 s
        let velocity = entities[0].physics.as_ref().unwrap().velocity.y;
        assert!((velocity + 5.0).abs() < 1e-4, "got {velocity}");
    }

    #[test]
    fn test_chunked_step_ignores_bad_frame_times() {
        let level = Level::test_room();
        let physics = PhysicsSystem::default();
        let mut entities = vec![player_at(Vec3::new(0.0, 1.0, 0.0))];
        for frame_dt in [f32::INFINITY, f32::NAN, -1.0, 0.0] {
            let events = physics.step_chunked(&mut entities, &level, frame_dt);
            assert!(events.is_empty());
        }
        assert_eq!(entities[0].position, Vec3::new(0.0, 1.0, 0.0), "Nothing should move");
        assert_eq!(entities[0].physics.as_ref().unwrap().velocity, Vec3::ZERO);
    }

    #[test]
    fn test_chunked_step_bounds_substeps() {
        let level = LevelBuilder::new("void").build();
        let mut config = PhysicsConfig::default();
        config.max_substep = 1.0e-9;
        let physics = PhysicsSystem::new(config);
        let mut entities = vec![player_at(Vec3::ZERO)];
        physics.step_chunked(&mut entities, &level, 0.1);

        let velocity = entities[0].physics.as_ref().unwrap().velocity.y;
        assert!((velocity + 2.0).abs() < 1e-4, "got {velocity}");
    }

    #[test]
    fn test_projectile_hits_wall() {
        let level = Level::test_room();
        let physics = PhysicsSystem::default();
        let mut entities = vec![Entity::projectile(
            EntityId(1),
            ProjectileKind::Rocket,
            Vec3::new(4.0, 1.0, 0.0),
            Vec3::X,
            None,
        )];
        let events = physics.step(&mut entities, &level, 0.1);
        assert!(matches!(events.as_slice(), [ProjectileEvent::HitWall { wall: Some(_), .. }]));
        assert!(!entities[0].is_active());
    }

    #[test]
    fn test_projectile_hits_entity_but_not_owner() {
        let level = Level::test_room();
        let physics = PhysicsSystem::default();
        let mut entities = vec![
            Entity::monster(EntityId(1), Species::Imp, Vec3::new(0.0, 0.0, 0.0)),
            Entity::monster(EntityId(2), Species::Demon, Vec3::new(1.0, 0.0, 0.0)),
            Entity::projectile(
                EntityId(3),
                ProjectileKind::Fireball,
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::X,
                Some(EntityId(1)),
            ),
        ];
        let events = physics.step(&mut entities, &level, 0.08);
        match events.as_slice() {
            [ProjectileEvent::HitEntity { target, damage, .. }] => {
                assert_eq!(*target, EntityId(2));
                assert_eq!(*damage, 3.0);
            }
            other => panic!("expected one entity hit, got {other:?}"),
        }

        PhysicsSystem::apply_projectile_damage(&mut entities, &events);
        let demon = entities[1].monster_state().unwrap();
        assert_eq!(demon.health, 57.0);
        assert_eq!(demon.target, Some(EntityId(1)));
    }

    #[test]
    fn test_projectile_expires() {
        let level = LevelBuilder::new("void").build();
        let physics = PhysicsSystem::default();
        let mut entities = vec![Entity::projectile(
            EntityId(1),
            ProjectileKind::Fireball,
            Vec3::ZERO,
            Vec3::X,
            None,
        )];
        let mut events = Vec::new();
        for _ in 0..6 {
            events.extend(physics.step(&mut entities, &level, 1.0));
        }
        assert_eq!(events, vec![ProjectileEvent::Expired { projectile: EntityId(1) }]);
        assert!((entities[0].position.x - 50.0).abs() < 1e-3);
    }
}
