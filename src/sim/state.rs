//! Game state and core simulation types
//!
//! All session state lives here and is owned by the single simulation thread.
//! Hosts read it between ticks and drain [`GameEvent`]s to drive displays.

use super::collision::{CollisionDetector, CollisionHit};
use super::entity::{Character, EntityId, EntityIds, EntityKind};
use super::mesh::CollisionMesh;
use super::rng::{SeededRng, SimRng};
use super::round::RoundProgression;
use super::spawn::{Spawned, Spawners};
use super::timer::{SimClock, TimerQueue};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Active descent
    Playing,
    /// Game is paused
    Paused,
    /// Health ran out
    GameOver,
}

/// Notifications for external collaborators (renderer, HUD, audio)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    EntitySpawned { kind: EntityKind, id: EntityId },
    EntityRemoved { kind: EntityKind, id: EntityId },
    ScoreChanged { score: u64 },
    HealthChanged { health: u32, delta: i32 },
    RoundStarted { round: u32 },
    GroundLevelChanged { ground_level: f32 },
    GameOver { score: u64, round: u32 },
}

/// Deferred actions owned by a flyer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyerTimer {
    /// End an away-from-character retreat
    Revert,
}

/// Score and health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    pub score: u64,
    /// Percentage in [0, max_health]
    pub health: u32,
    pub max_health: u32,
}

impl Vitals {
    pub fn new(max_health: u32) -> Self {
        Self {
            score: 0,
            health: max_health,
            max_health,
        }
    }

    /// Heal, capped at max; returns the applied delta
    pub fn increase_health(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health - before
    }

    /// Damage, floored at zero; returns the applied delta
    pub fn decrease_health(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_sub(amount);
        before - self.health
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    pub fn is_depleted(&self) -> bool {
        self.health == 0
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.max_health);
    }
}

/// Complete session state
#[derive(Debug)]
pub struct GameState {
    pub tuning: Tuning,
    /// Injectable randomness (seeded in play, scripted in tests)
    pub rng: Box<dyn SimRng>,
    pub clock: SimClock,
    pub phase: GamePhase,
    pub character: Character,
    pub spawners: Spawners,
    pub detector: CollisionDetector,
    pub progression: RoundProgression,
    pub vitals: Vitals,
    pub timers: TimerQueue<FlyerTimer>,
    /// Derived camera height (follows the character)
    pub camera_y: f32,
    /// Derived ground height for displays (follows the current round)
    pub ground_follow_y: f32,
    /// Simulation frame counter
    pub frame: u64,
    events: Vec<GameEvent>,
    ids: EntityIds,
}

impl GameState {
    /// Create a new session with default tuning and the given seed
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(Tuning::default(), Box::new(SeededRng::new(seed)))
    }

    pub fn with_tuning(tuning: Tuning, mut rng: Box<dyn SimRng>) -> Self {
        let progression = RoundProgression::new(tuning.round.clone());
        let ground_level = progression.ground_level();
        let mut ids = EntityIds::default();
        let character = Character::new(ids.next_id(), tuning.character.start_y, ground_level);
        let spawners = Spawners::new(&tuning, ground_level, rng.as_mut());
        let camera_y = tuning.character.start_y + tuning.character.camera_offset;

        log::info!("New session, ground at {:.0}", ground_level);

        Self {
            detector: CollisionDetector::new(&tuning.collision),
            vitals: Vitals::new(tuning.collision.max_health),
            clock: SimClock::default(),
            phase: GamePhase::Playing,
            timers: TimerQueue::new(),
            camera_y,
            ground_follow_y: ground_level,
            frame: 0,
            events: Vec::new(),
            tuning,
            rng,
            character,
            spawners,
            progression,
            ids,
        }
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Asset collaborator callback: the character's collision shape loaded
    pub fn attach_character_mesh(&mut self, mesh: CollisionMesh) {
        self.character.handle.mesh = Some(mesh);
    }

    /// Asset collaborator callback: a category's collision mesh loaded.
    /// Returns false for categories that never collide.
    pub fn attach_category_mesh(&mut self, kind: EntityKind, mesh: CollisionMesh) -> bool {
        self.spawners.set_mesh(kind, mesh)
    }

    pub fn round(&self) -> u32 {
        self.progression.current_round()
    }

    pub fn ground_level(&self) -> f32 {
        self.progression.ground_level()
    }

    /// Spawn pass for all four categories
    pub(crate) fn run_spawn_pass(&mut self) {
        let round = self.progression.current_round();
        let spawned = self.spawners.generate(
            self.character.position().y,
            round,
            &self.tuning,
            &mut self.ids,
            self.rng.as_mut(),
        );
        self.events.extend(
            spawned
                .into_iter()
                .map(|(kind, id)| GameEvent::EntitySpawned { kind, id }),
        );
    }

    /// Cull pass for all four categories
    pub(crate) fn run_cull_pass(&mut self) {
        let removed = self.spawners.cull(self.character.position().y);
        self.forget(removed);
    }

    /// Emit removal events and cancel timers owned by removed entities
    fn forget(&mut self, removed: Vec<Spawned>) {
        for (kind, id) in removed {
            let cancelled = self.timers.cancel_owner(id);
            if cancelled > 0 {
                log::debug!("Cancelled {} timers owned by {:?}", cancelled, id);
            }
            self.events.push(GameEvent::EntityRemoved { kind, id });
        }
    }

    /// Apply the score/health consequences of a collision
    pub fn apply_hit(&mut self, hit: CollisionHit) {
        match hit {
            CollisionHit::Ring(id) => {
                self.vitals.add_score(1);
                let healed = self.vitals.increase_health(self.tuning.collision.ring_heal);
                log::debug!("Collected ring {:?}, score {}", id, self.vitals.score);
                self.events.push(GameEvent::ScoreChanged {
                    score: self.vitals.score,
                });
                self.events.push(GameEvent::HealthChanged {
                    health: self.vitals.health,
                    delta: healed as i32,
                });
            }
            CollisionHit::Flyer(id) => {
                let lost = self.vitals.decrease_health(self.tuning.collision.flyer_damage);
                log::debug!("Hit by flyer {:?}, health {}", id, self.vitals.health);
                self.events.push(GameEvent::HealthChanged {
                    health: self.vitals.health,
                    delta: -(lost as i32),
                });
                if self.vitals.is_depleted() && self.phase != GamePhase::GameOver {
                    self.phase = GamePhase::GameOver;
                    log::info!(
                        "Game over in round {} with score {}",
                        self.round(),
                        self.vitals.score
                    );
                    self.events.push(GameEvent::GameOver {
                        score: self.vitals.score,
                        round: self.round(),
                    });
                }
            }
        }
    }

    /// Partial reset (new round) or full reset (new game). Both reposition
    /// the character and reset every spawn window at the current ground.
    pub fn reset(&mut self, full: bool) {
        if full {
            self.progression.reset();
            self.vitals.reset();
            self.detector.reset();
            self.timers.clear();
            self.phase = GamePhase::Playing;
            self.events.push(GameEvent::ScoreChanged {
                score: self.vitals.score,
            });
            self.events.push(GameEvent::HealthChanged {
                health: self.vitals.health,
                delta: 0,
            });
        }

        let ground_level = self.progression.ground_level();
        self.character
            .reposition(self.tuning.character.start_y, ground_level);
        let removed = self
            .spawners
            .reset(ground_level, &self.tuning, self.rng.as_mut());
        self.forget(removed);
        self.camera_y = self.character.position().y + self.tuning.character.camera_offset;
        self.ground_follow_y = ground_level;

        self.events.push(GameEvent::RoundStarted {
            round: self.round(),
        });
        self.events
            .push(GameEvent::GroundLevelChanged { ground_level });
        log::info!(
            "{} reset: round {}, ground {:.0}",
            if full { "Full" } else { "Partial" },
            self.round(),
            ground_level
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::HasHandle;
    use proptest::prelude::*;

    #[test]
    fn test_health_clamps() {
        let mut vitals = Vitals::new(100);
        vitals.health = 15;
        assert_eq!(vitals.decrease_health(20), 15);
        assert_eq!(vitals.health, 0);
        assert!(vitals.is_depleted());

        vitals.health = 95;
        assert_eq!(vitals.increase_health(10), 5);
        assert_eq!(vitals.health, 100);
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_range(ops in prop::collection::vec((any::<bool>(), 0u32..200), 0..50)) {
            let mut vitals = Vitals::new(100);
            for (heal, amount) in ops {
                if heal {
                    vitals.increase_health(amount);
                } else {
                    vitals.decrease_health(amount);
                }
                prop_assert!(vitals.health <= 100);
            }
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let state = GameState::new(1);
        assert_eq!(state.round(), 1);
        assert_eq!(state.ground_level(), -100.0);
        assert_eq!(state.vitals, Vitals::new(100));
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.spawners.live_count(), 0);
    }

    #[test]
    fn test_ring_hit_scores_and_heals() {
        let mut state = GameState::new(1);
        state.vitals.health = 50;
        state.apply_hit(CollisionHit::Ring(EntityId(5)));
        assert_eq!(state.vitals.score, 1);
        assert_eq!(state.vitals.health, 60);
        assert_eq!(
            state.drain_events(),
            vec![
                GameEvent::ScoreChanged { score: 1 },
                GameEvent::HealthChanged {
                    health: 60,
                    delta: 10
                },
            ]
        );
    }

    #[test]
    fn test_flyer_hits_end_the_game() {
        let mut state = GameState::new(1);
        for _ in 0..5 {
            state.apply_hit(CollisionHit::Flyer(EntityId(5)));
        }
        assert_eq!(state.vitals.health, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        let game_overs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_full_reset_restores_everything() {
        let mut state = second_round(7);
        for _ in 0..20 {
            state.run_spawn_pass();
        }
        state.apply_hit(CollisionHit::Ring(EntityId(5)));
        state.apply_hit(CollisionHit::Flyer(EntityId(6)));
        state.progression.check_round_end(-10_000.0);
        state.character.handle.position.y = -400.0;
        assert!(state.spawners.live_count() > 0);
        state.drain_events();

        state.reset(true);
        assert_eq!(state.round(), 1);
        assert_eq!(state.ground_level(), -100.0);
        assert_eq!(state.vitals, Vitals::new(100));
        assert_eq!(state.spawners.live_count(), 0);
        assert_eq!(state.character.position().y, state.tuning.character.start_y);
        assert!(state.timers.is_empty());
        assert!(!state.detector.guard().is_open());
        assert!(state
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::EntityRemoved { .. })));
    }

    #[test]
    fn test_partial_reset_keeps_vitals() {
        let mut state = GameState::new(7);
        state.apply_hit(CollisionHit::Ring(EntityId(5)));
        state.progression.check_round_end(-10_000.0);
        state.reset(false);
        assert_eq!(state.round(), 2);
        assert_eq!(state.ground_level(), -500.0);
        assert_eq!(state.vitals.score, 1);
        assert_eq!(state.character.ground_level, -500.0);
        assert_eq!(state.spawners.rings.ground_level(), -500.0);
        assert!(state.spawners.floor.iter().all(|p| p.offset.y == -500.0));
    }

    /// Session moved on to round 2 with a clean event queue
    fn second_round(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.progression.check_round_end(-10_000.0);
        state.reset(false);
        state.drain_events();
        state
    }

    #[test]
    fn test_round_one_spawns_every_category() {
        let mut state = GameState::new(7);
        state.run_spawn_pass();
        assert_eq!(state.spawners.rings.live().len(), 1);
        assert_eq!(state.spawners.flyers.live().len(), 1);
        assert_eq!(state.spawners.clouds.live().len(), 1);
        assert_eq!(state.spawners.terrain.live().len(), 1);
        assert_eq!(state.spawners.rings.live()[0].y(), 270.0);
    }

    #[test]
    fn test_removal_cancels_owned_timers() {
        let mut state = second_round(7);
        state.run_spawn_pass();
        let flyer_id = state.spawners.flyers.live()[0].handle.id;
        state.timers.schedule(flyer_id, 500, FlyerTimer::Revert);

        state.reset(false);
        assert!(!state.timers.has_pending(flyer_id));
    }

    #[test]
    fn test_cull_cancels_owned_timers() {
        let mut state = second_round(7);
        state.run_spawn_pass();
        let flyer_id = state.spawners.flyers.live()[0].handle.id;
        state.timers.schedule(flyer_id, 500, FlyerTimer::Revert);

        // Fall well past the flyer so the cull pass drops it
        state.character.handle.position.y = -200.0;
        state.run_cull_pass();
        assert!(state.spawners.flyers.get_mut(flyer_id).is_none());
        assert!(!state.timers.has_pending(flyer_id));
        assert!(state.drain_events().contains(&GameEvent::EntityRemoved {
            kind: EntityKind::Flyer,
            id: flyer_id,
        }));
    }

    #[test]
    fn test_category_mesh_attach() {
        let mut state = second_round(7);
        assert!(state.attach_category_mesh(EntityKind::Flyer, CollisionMesh::cube(0.5)));
        assert!(!state.attach_category_mesh(EntityKind::Terrain, CollisionMesh::cube(0.5)));
        state.run_spawn_pass();
        assert!(state.spawners.flyers.live()[0].handle.has_collision());
    }
}
