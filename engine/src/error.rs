//! Error types
//!
//! Per-frame queries (collision, raycasts, sector lookup) never fail; they fall
//! back to well-defined "no effect" values. The errors here cover the places
//! where bad input must be rejected up front: building geometry, assembling a
//! level and loading files.

use glam::Vec3;
use thiserror::Error;

/// Contract violations detected while constructing geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("box min {min:?} exceeds max {max:?} on at least one axis")]
    InvertedBox { min: Vec3, max: Vec3 },

    #[error("box corners must be finite, got min {min:?} max {max:?}")]
    NonFiniteBox { min: Vec3, max: Vec3 },

    #[error("box size {0:?} has a negative component")]
    NegativeSize(Vec3),

    #[error("ceiling height {ceiling} must be above floor height {floor}")]
    InvalidSectorHeights { floor: f32, ceiling: f32 },

    #[error("light level {0} outside [0, 1]")]
    InvalidLightLevel(f32),

    #[error("mass {0} must be positive and finite")]
    InvalidMass(f32),
}

/// Errors raised while assembling or loading a level.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("wall {wall} references unknown sector {sector}")]
    UnknownSector { wall: usize, sector: usize },

    #[error("sector id {0} is defined more than once")]
    DuplicateSector(u32),

    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse level JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
