//! Engine Configuration
//!
//! Centralized tuning values for physics, the player body and the level
//! spatial index. `Default` returns the values the game ships with; every
//! field can be overridden from a JSON file where missing keys keep their
//! defaults.
//!
//! ```ignore
//! use sector_arena_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "physics": { "gravity": 9.81 } }"#)?;
//! assert_eq!(config.physics.ground_damping, 0.9);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::world::PartitionStrategy;

/// Gravity acceleration in units per second squared.
pub const GRAVITY: f32 = 20.0;

/// Horizontal velocity multiplier applied every step while grounded.
pub const GROUND_DAMPING: f32 = 0.9;

/// Extra distance added to every wall push-out so the resolved box is
/// strictly separated after floating point rounding.
pub const PUSH_EPSILON: f32 = 0.001;

/// Highest floor rise a walking body climbs without jumping.
pub const STEP_HEIGHT: f32 = 0.5;

/// Longest sub-step `PhysicsSystem::step_chunked` integrates at once (66ms).
pub const MAX_SUBSTEP: f32 = 0.066;

/// Longest frame `PhysicsSystem::step_chunked` simulates; longer hitches are
/// cut to this.
pub const MAX_FRAME_TIME: f32 = 0.25;

/// Physics tuning shared by every simulated body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration applied to airborne bodies with gravity enabled
    pub gravity: f32,
    /// Horizontal velocity multiplier applied each step while on the ground
    pub ground_damping: f32,
    /// Separation margin added to wall push-out
    pub push_epsilon: f32,
    /// Maximum floor rise a body can step onto through a portal
    pub step_height: f32,
    /// Upper bound on a single integration sub-step (seconds)
    pub max_substep: f32,
    /// Upper bound on the frame time simulated by one chunked step (seconds)
    pub max_frame_time: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            ground_damping: GROUND_DAMPING,
            push_epsilon: PUSH_EPSILON,
            step_height: STEP_HEIGHT,
            max_substep: MAX_SUBSTEP,
            max_frame_time: MAX_FRAME_TIME,
        }
    }
}

/// Player body and movement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Horizontal radius of the player footprint
    pub radius: f32,
    /// Height of the player footprint above the feet
    pub height: f32,
    /// Camera height above the feet
    pub eye_height: f32,
    /// Walking speed in units per second
    pub speed: f32,
    /// Speed multiplier while sprinting
    pub sprint_multiplier: f32,
    /// Upward velocity given by a jump
    pub jump_velocity: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 0.3,
            height: 1.75,
            eye_height: 1.1,
            speed: 5.0,
            sprint_multiplier: 1.5,
            jump_velocity: 8.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    /// How the level spatial index is partitioned at build time
    pub partition: PartitionStrategy,
}

impl EngineConfig {
    /// Parses a JSON document and validates the result.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if !physics.gravity.is_finite() || physics.gravity < 0.0 {
            return Err(invalid("physics.gravity", "must be finite and non-negative"));
        }
        if !(0.0..=1.0).contains(&physics.ground_damping) {
            return Err(invalid("physics.ground_damping", "must lie in [0, 1]"));
        }
        if !(physics.push_epsilon >= 0.0) {
            return Err(invalid("physics.push_epsilon", "must be non-negative"));
        }
        if !(physics.step_height >= 0.0) {
            return Err(invalid("physics.step_height", "must be non-negative"));
        }
        if !(physics.max_substep > 0.0) {
            return Err(invalid("physics.max_substep", "must be positive"));
        }
        if !physics.max_frame_time.is_finite() || !(physics.max_frame_time >= physics.max_substep) {
            return Err(invalid("physics.max_frame_time", "must be finite and at least max_substep"));
        }

        let player = &self.player;
        if !(player.radius > 0.0) || !(player.height > 0.0) {
            return Err(invalid("player", "radius and height must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
