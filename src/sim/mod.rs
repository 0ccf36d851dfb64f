//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, time read from the simulation clock
//! - Injected RNG only
//! - Stable iteration order (spawn order within each category)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod flyer;
pub mod mesh;
pub mod rng;
pub mod round;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timer;

pub use collision::{CollisionDetector, CollisionHit, ImmunityGuard};
pub use entity::{
    Character, Cloud, EntityHandle, EntityId, EntityKind, Flyer, HasHandle, Piece, Ring,
    TerrainCluster,
};
pub use flyer::{ChaseState, FlyerBehavior, FlyerMode, TargetState};
pub use mesh::{CollisionMesh, ray_triangle};
pub use rng::{ScriptedRng, SeededRng, SimRng};
pub use round::RoundProgression;
pub use spawn::{SpawnWindow, Spawners};
pub use state::{FlyerTimer, GameEvent, GamePhase, GameState, Vitals};
pub use tick::{TickInput, tick};
pub use timer::{SimClock, TimerQueue};
