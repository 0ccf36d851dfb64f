//! Round and ground progression
//!
//! A round ends when the character gets within `end_margin` of the ground.
//! Each new round pushes the ground further down, bounded by a floor.

use crate::tuning::RoundTuning;

/// Round counter and ground depth, mutated only through this controller
#[derive(Debug, Clone, PartialEq)]
pub struct RoundProgression {
    current_round: u32,
    ground_level: f32,
    tuning: RoundTuning,
}

impl RoundProgression {
    pub fn new(tuning: RoundTuning) -> Self {
        Self {
            current_round: 1,
            ground_level: tuning.initial_ground_level,
            tuning,
        }
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn ground_level(&self) -> f32 {
        self.ground_level
    }

    /// True once the character drops below `ground + end_margin`; advances
    /// the round counter and recomputes the ground when it does
    pub fn check_round_end(&mut self, character_y: f32) -> bool {
        if character_y >= self.ground_level + self.tuning.end_margin {
            return false;
        }
        self.current_round += 1;
        self.ground_level = self.compute_ground_level(self.current_round);
        log::info!(
            "Round {} begins, ground at {:.0}",
            self.current_round,
            self.ground_level
        );
        true
    }

    /// `max(ground - round * recession, floor)`: never rises, never passes the floor
    pub fn compute_ground_level(&self, round: u32) -> f32 {
        (self.ground_level - round as f32 * self.tuning.recession_per_round)
            .max(self.tuning.ground_floor)
    }

    /// Full reset back to round 1 at the initial ground depth
    pub fn reset(&mut self) {
        self.current_round = 1;
        self.ground_level = self.tuning.initial_ground_level;
        log::info!("Progression reset to round 1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn progression() -> RoundProgression {
        RoundProgression::new(RoundTuning::default())
    }

    #[test]
    fn test_starts_at_round_one() {
        let p = progression();
        assert_eq!(p.current_round(), 1);
        assert_eq!(p.ground_level(), -100.0);
    }

    #[test]
    fn test_round_end_boundary() {
        let mut p = progression();
        assert!(!p.check_round_end(0.0));
        assert_eq!(p.current_round(), 1);
        assert!(p.check_round_end(-1.0));
        assert_eq!(p.current_round(), 2);
    }

    #[test]
    fn test_compute_ground_level() {
        let p = progression();
        assert_eq!(p.compute_ground_level(1), -300.0);
        assert_eq!(p.compute_ground_level(20), -3000.0);
    }

    #[test]
    fn test_round_end_recedes_ground() {
        let mut p = progression();
        assert!(p.check_round_end(-50.0));
        // Round 2: -100 - 2 * 200
        assert_eq!(p.ground_level(), -500.0);
        assert!(!p.check_round_end(-400.0));
        assert!(p.check_round_end(-401.0));
        assert_eq!(p.ground_level(), -1100.0);
    }

    #[test]
    fn test_reset_restores_start() {
        let mut p = progression();
        for _ in 0..5 {
            p.check_round_end(-10_000.0);
        }
        p.reset();
        assert_eq!(p.current_round(), 1);
        assert_eq!(p.ground_level(), -100.0);
    }

    proptest! {
        #[test]
        fn prop_ground_monotonic_and_floored(depths in prop::collection::vec(-5000.0f32..0.0, 1..60)) {
            let mut p = progression();
            let mut last_ground = p.ground_level();
            let mut last_round = p.current_round();
            for y in depths {
                p.check_round_end(y);
                prop_assert!(p.ground_level() <= last_ground);
                prop_assert!(p.ground_level() >= -3000.0);
                prop_assert!(p.current_round() >= last_round);
                last_ground = p.ground_level();
                last_round = p.current_round();
            }
        }
    }
}
