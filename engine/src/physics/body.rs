//! Rigid body state
//!
//! [`PhysicsComponent`] holds the rate-of-change state of one entity. It never
//! touches the entity's position: [`PhysicsComponent::integrate`] updates
//! velocity and [`PhysicsComponent::displacement`] reports how far the body
//! wants to move, leaving the move itself to the caller.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::error::GeometryError;

fn check_mass(mass: f32) -> Result<f32, GeometryError> {
    if mass.is_finite() && mass > 0.0 {
        Ok(mass)
    } else {
        Err(GeometryError::InvalidMass(mass))
    }
}

/// Per-entity velocity, accumulated acceleration and ground state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsComponent {
    pub velocity: Vec3,
    /// Accumulated this step; cleared by `integrate`
    pub acceleration: Vec3,
    mass: f32,
    pub use_gravity: bool,
    /// Recomputed by the ground clamp every physics step
    pub on_ground: bool,
}

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self::new(1.0, true)
    }
}

impl PhysicsComponent {
    /// Creates a body at rest.
    ///
    /// # Panics
    /// Panics if `mass` is not a positive finite number; use
    /// [`PhysicsComponent::try_new`] for untrusted input.
    pub fn new(mass: f32, use_gravity: bool) -> Self {
        match Self::try_new(mass, use_gravity) {
            Ok(body) => body,
            Err(err) => panic!("invalid body: {err}"),
        }
    }

    /// Creates a body at rest, rejecting zero, negative and non-finite mass.
    pub fn try_new(mass: f32, use_gravity: bool) -> Result<Self, GeometryError> {
        Ok(Self {
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            mass: check_mass(mass)?,
            use_gravity,
            on_ground: false,
        })
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Leaves the mass unchanged when `mass` is rejected.
    pub fn set_mass(&mut self, mass: f32) -> Result<(), GeometryError> {
        self.mass = check_mass(mass)?;
        Ok(())
    }

    /// Adds `force / mass` to this step's acceleration.
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force / self.mass;
    }

    /// Adds `impulse / mass` straight to the velocity.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.mass;
    }

    /// Advances velocity by `dt`.
    ///
    /// In order: gravity (airborne bodies only), `velocity += acceleration *
    /// dt`, acceleration reset, then ground friction on the horizontal
    /// components.
    pub fn integrate(&mut self, dt: f32, config: &PhysicsConfig) {
        if self.use_gravity && !self.on_ground {
            self.acceleration.y -= config.gravity;
        }

        self.velocity += self.acceleration * dt;
        self.acceleration = Vec3::ZERO;

        if self.on_ground {
            self.velocity.x *= config.ground_damping;
            self.velocity.z *= config.ground_damping;
        }
    }

    /// Distance the body wants to travel this step.
    pub fn displacement(&self, dt: f32) -> Vec3 {
        self.velocity * dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_only_when_airborne() {
        let config = PhysicsConfig::default();
        let mut body = PhysicsComponent::default();
        body.integrate(0.1, &config);
        assert!((body.velocity.y + 2.0).abs() < 1e-5, "got {}", body.velocity.y);

        let mut grounded = PhysicsComponent::default();
        grounded.on_ground = true;
        grounded.integrate(0.1, &config);
        assert_eq!(grounded.velocity.y, 0.0);
    }

    #[test]
    fn test_forces_compose_and_reset() {
        let config = PhysicsConfig::default();
        let mut body = PhysicsComponent::new(2.0, false);
        body.apply_force(Vec3::new(4.0, 0.0, 0.0));
        body.apply_force(Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(body.acceleration, Vec3::new(3.0, 0.0, 1.0));

        body.integrate(0.5, &config);
        assert_eq!(body.velocity, Vec3::new(1.5, 0.0, 0.5));
        assert_eq!(body.acceleration, Vec3::ZERO);

        body.integrate(0.5, &config);
        assert_eq!(body.velocity, Vec3::new(1.5, 0.0, 0.5), "Forces must be re-applied each step");
    }

    #[test]
    fn test_impulse_bypasses_dt() {
        let mut body = PhysicsComponent::new(4.0, true);
        body.apply_impulse(Vec3::new(0.0, 8.0, 0.0));
        assert_eq!(body.velocity, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_ground_damping_horizontal_only() {
        let config = PhysicsConfig::default();
        let mut body = PhysicsComponent::default();
        body.on_ground = true;
        body.velocity = Vec3::new(10.0, 3.0, -10.0);
        body.integrate(0.016, &config);
        assert!((body.velocity.x - 9.0).abs() < 1e-5);
        assert!((body.velocity.z + 9.0).abs() < 1e-5);
        assert_eq!(body.velocity.y, 3.0);
    }

    #[test]
    fn test_rejects_bad_mass() {
        for mass in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            assert!(
                matches!(PhysicsComponent::try_new(mass, true), Err(GeometryError::InvalidMass(_))),
                "mass {mass} should be rejected"
            );
        }

        let mut body = PhysicsComponent::new(2.0, true);
        assert_eq!(body.set_mass(0.0), Err(GeometryError::InvalidMass(0.0)));
        assert_eq!(body.mass(), 2.0, "Rejected mass must not be stored");
        assert_eq!(body.set_mass(0.5), Ok(()));
        assert_eq!(body.mass(), 0.5);
    }

    #[test]
    #[should_panic(expected = "invalid body")]
    fn test_new_panics_on_zero_mass() {
        let _ = PhysicsComponent::new(0.0, true);
    }
}
