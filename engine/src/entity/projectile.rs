//! Projectiles
//!
//! Projectiles fly in a straight line at constant speed. They carry no
//! physics body; `PhysicsSystem` advances them kinematically and retires them
//! on wall contact, entity contact or when their lifetime runs out.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// Seconds a projectile lives before despawning.
pub const PROJECTILE_LIFETIME: f32 = 5.0;

/// Edge length of a projectile's cubic footprint.
pub const PROJECTILE_SIZE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Thrown by imps
    Fireball,
    Rocket,
}

impl ProjectileKind {
    pub fn speed(self) -> f32 {
        match self {
            ProjectileKind::Fireball => 10.0,
            ProjectileKind::Rocket => 20.0,
        }
    }

    pub fn damage(self) -> f32 {
        match self {
            ProjectileKind::Fireball => 3.0,
            ProjectileKind::Rocket => 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileState {
    pub kind: ProjectileKind,
    /// Unit direction of travel (zero for a projectile fired without one)
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    /// Entity that fired it; never hit by its own projectile
    pub owner: Option<EntityId>,
    /// Seconds left before despawning
    pub lifetime: f32,
}

impl ProjectileState {
    pub fn new(kind: ProjectileKind, direction: Vec3, owner: Option<EntityId>) -> Self {
        Self {
            kind,
            direction: direction.normalize_or_zero(),
            speed: kind.speed(),
            damage: kind.damage(),
            owner,
            lifetime: PROJECTILE_LIFETIME,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.direction * self.speed
    }

    /// Counts down the lifetime; returns `true` once it has expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.lifetime -= dt;
        self.lifetime <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_stats() {
        let fireball = ProjectileState::new(ProjectileKind::Fireball, Vec3::new(0.0, 0.0, 3.0), None);
        assert_eq!(fireball.velocity(), Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(fireball.damage, 3.0);
        assert_eq!(ProjectileKind::Rocket.damage(), 100.0);
    }

    #[test]
    fn test_lifetime_expires() {
        let mut rocket = ProjectileState::new(ProjectileKind::Rocket, Vec3::X, Some(EntityId(1)));
        assert!(!rocket.tick(4.0));
        assert!(rocket.tick(1.0));
    }

    #[test]
    fn test_zero_direction_stays_put() {
        let state = ProjectileState::new(ProjectileKind::Fireball, Vec3::ZERO, None);
        assert_eq!(state.velocity(), Vec3::ZERO);
    }
}
