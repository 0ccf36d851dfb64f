//! Skyfall - an endless-descent arcade game core
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (spawning, flyers, collisions, rounds)
//! - `tuning`: Data-driven game balance
//! - `error`: Error types surfaced by tuning and collision geometry

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{GeometryError, TuningError};
pub use tuning::Tuning;

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (~60 Hz)
    pub const SIM_DT_MS: u64 = 16;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Character start height (session-start sentinel for every spawn window).
    /// Sits above the first round's ground plus the end margin and stop buffer
    /// so round 1 has rings to collect.
    pub const START_Y: f32 = 300.0;

    /// Round/ground defaults
    pub const INITIAL_GROUND_LEVEL: f32 = -100.0;
    pub const GROUND_RECESSION_PER_ROUND: f32 = 200.0;
    pub const GROUND_FLOOR: f32 = -3000.0;
    pub const ROUND_END_MARGIN: f32 = 100.0;

    /// Spawn window margins
    pub const LOOKAHEAD_MARGIN: f32 = 50.0;
    pub const CULL_MARGIN: f32 = 20.0;

    /// Collision
    pub const COLLISION_THRESHOLD: f32 = 0.25;
    pub const IMMUNITY_MS: u64 = 1000;

    /// Vitals
    pub const MAX_HEALTH: u32 = 100;
    pub const RING_HEAL: u32 = 10;
    pub const FLYER_DAMAGE: u32 = 20;

    /// Flyer behaviour
    pub const FLYER_TURN_DISTANCE: f32 = 0.5;
    pub const FLYER_DEADZONE: f32 = 0.01;
    pub const FLYER_FLIP_CHANCE: f32 = 0.005;
    pub const FLYER_AWAY_MS: u64 = 500;
    pub const FLYER_VELOCITY_CAP_RATIO: f32 = 0.95;
    pub const FLYER_VELOCITY_BASE: f32 = 1.1;
}

/// Project a point onto the horizontal (XZ) plane
#[inline]
pub fn horizontal(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Lift a horizontal (XZ) vector back into 3D at the given height
#[inline]
pub fn from_horizontal(h: Vec2, y: f32) -> Vec3 {
    Vec3::new(h.x, y, h.y)
}

/// Horizontal distance between two points, ignoring height
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(a).distance(horizontal(b))
}
