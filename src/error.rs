//! Error types
//!
//! Nothing in the per-frame path is fatal: geometry errors skip a collision
//! pass and are retried next frame, tuning errors are reported at load time.

use thiserror::Error;

/// Failure loading or validating [`crate::Tuning`].
#[derive(Debug, Error)]
pub enum TuningError {
    /// The tuning file could not be read.
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    /// The JSON document could not be parsed.
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    /// A spawn window was configured with a non-positive spacing.
    #[error("{category} spawn window spacing must be positive, got {spacing}")]
    InvalidSpacing {
        category: &'static str,
        spacing: f32,
    },
    /// A margin, delay or ratio was outside its valid range.
    #[error("{name} is out of range: {value}")]
    InvalidValue { name: &'static str, value: f32 },
}

/// Collision geometry that cannot be ray cast yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The mesh carries no per-vertex normals.
    #[error("mesh has no vertex normals")]
    MissingNormals,
    /// Normal and vertex buffers disagree in length.
    #[error("mesh has {vertices} vertices but {normals} normals")]
    NormalCountMismatch { vertices: usize, normals: usize },
    /// A triangle references a vertex that does not exist.
    #[error("triangle index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}
