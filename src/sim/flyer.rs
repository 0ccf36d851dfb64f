//! Flyer behaviour state machine
//!
//! Two movement modes, each with its own sub-states. All movement happens on
//! the horizontal plane; flyers never change height once spawned.

use glam::{Vec2, Vec3};

use super::rng::SimRng;
use crate::consts::{FLYER_VELOCITY_BASE, FLYER_VELOCITY_CAP_RATIO};
use crate::tuning::FlyerTuning;
use crate::{from_horizontal, horizontal};

/// Sub-states of target-point tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Heading for the recorded point
    InitialTracking,
    /// Reached the point once; now oscillates around it
    StartTurning,
}

/// Sub-states of character tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaseState {
    TowardCharacter,
    /// Temporary retreat; a timer reverts it
    AwayFromCharacter,
}

/// Movement mode with only the fields valid for that mode
#[derive(Debug, Clone, PartialEq)]
pub enum FlyerMode {
    TrackTargetPoint {
        state: TargetState,
        target: Vec3,
        /// Unit horizontal direction (X, Z)
        direction: Vec2,
    },
    TrackCharacter {
        state: ChaseState,
    },
}

/// Per-flyer movement controller
#[derive(Debug, Clone, PartialEq)]
pub struct FlyerBehavior {
    pub mode: FlyerMode,
    /// Horizontal units moved per frame
    pub velocity: f32,
    /// Velocity cap; round scaling never exceeds 95% of this
    pub max_velocity: f32,
    pub oscillation_radius: f32,
}

impl FlyerBehavior {
    /// Home toward `target` (projected to the flyer's height)
    pub fn track_target_point(position: Vec3, target: Vec3, tuning: &FlyerTuning) -> Self {
        let target = Vec3::new(target.x, position.y, target.z);
        let direction = (horizontal(target) - horizontal(position)).normalize_or_zero();
        Self {
            mode: FlyerMode::TrackTargetPoint {
                state: TargetState::InitialTracking,
                target,
                direction,
            },
            velocity: 0.0,
            max_velocity: tuning.max_velocity,
            oscillation_radius: tuning.oscillation_radius,
        }
    }

    pub fn track_character(tuning: &FlyerTuning) -> Self {
        Self {
            mode: FlyerMode::TrackCharacter {
                state: ChaseState::TowardCharacter,
            },
            velocity: 0.0,
            max_velocity: tuning.max_velocity,
            oscillation_radius: tuning.oscillation_radius,
        }
    }

    /// Fraction of max velocity for a round: `min(0.95, 1 - 1.1^-round)`
    pub fn velocity_multiplier(round: u32) -> f32 {
        let exponent = -(round.min(i32::MAX as u32) as i32);
        (1.0 - FLYER_VELOCITY_BASE.powi(exponent)).min(FLYER_VELOCITY_CAP_RATIO)
    }

    pub fn set_velocity_for_round(&mut self, round: u32) {
        self.velocity = Self::velocity_multiplier(round) * self.max_velocity;
    }

    /// Advance one frame. Returns the delay (ms) of a revert timer the caller
    /// must schedule when the flyer just started retreating.
    pub fn step(
        &mut self,
        position: &mut Vec3,
        character: Vec3,
        tuning: &FlyerTuning,
        rng: &mut dyn SimRng,
    ) -> Option<u64> {
        let velocity = self.velocity;
        let radius = self.oscillation_radius;
        match &mut self.mode {
            FlyerMode::TrackTargetPoint {
                state,
                target,
                direction,
            } => {
                let offset = horizontal(*position) - horizontal(*target);
                let distance = offset.length();
                if *state == TargetState::InitialTracking && distance <= tuning.turn_distance {
                    *state = TargetState::StartTurning;
                }
                if *state == TargetState::StartTurning {
                    if rng.chance(tuning.flip_chance) {
                        *direction = -*direction;
                    }
                    // Hard bound: never keep heading outward past the radius
                    if distance >= radius && direction.dot(offset) > 0.0 {
                        *direction = -*direction;
                    }
                }
                *position += from_horizontal(*direction * velocity, 0.0);
                None
            }
            FlyerMode::TrackCharacter { state } => {
                let to_character = horizontal(character) - horizontal(*position);
                let length = to_character.length();
                if length <= tuning.deadzone {
                    return None;
                }
                let mut scheduled = None;
                if *state == ChaseState::TowardCharacter && rng.chance(tuning.flip_chance) {
                    *state = ChaseState::AwayFromCharacter;
                    scheduled = Some(tuning.away_ms);
                }
                let mut heading = to_character / length;
                if *state == ChaseState::AwayFromCharacter {
                    heading = -heading;
                }
                *position += from_horizontal(heading * velocity, 0.0);
                scheduled
            }
        }
    }

    /// Timer callback: end a retreat
    pub fn revert(&mut self) {
        if let FlyerMode::TrackCharacter { state } = &mut self.mode {
            *state = ChaseState::TowardCharacter;
        }
    }

    pub fn is_retreating(&self) -> bool {
        matches!(
            self.mode,
            FlyerMode::TrackCharacter {
                state: ChaseState::AwayFromCharacter
            }
        )
    }
}
