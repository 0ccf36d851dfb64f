//! Simulation tick
//!
//! Core game loop that advances the session by one frame.

use glam::Vec2;

use super::state::{FlyerTimer, GamePhase, GameState};

/// Input for a single tick, already derived from the raw device state
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal movement intent (X, Z), length clamped to 1
    pub movement: Vec2,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one frame of `dt_ms` milliseconds
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: u64) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused");
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::info!("Resumed");
            }
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return,
        GamePhase::Playing => {}
    }

    state.frame += 1;
    let now = state.clock.advance(dt_ms);

    fire_timers(state, now);
    advance_character(state, input);
    advance_flyers(state, now);

    state.run_spawn_pass();
    state.run_cull_pass();

    collision_pass(state, now);

    if state.phase == GamePhase::Playing
        && state
            .progression
            .check_round_end(state.character.position().y)
    {
        state.reset(false);
    }

    update_follow(state);
}

/// Frame-start timers: immunity closure and flyer reversions
fn fire_timers(state: &mut GameState, now: u64) {
    if state.detector.poll(now) {
        log::debug!("Immunity closed at {}ms", now);
    }
    for (owner, timer) in state.timers.drain_due(now) {
        match timer {
            FlyerTimer::Revert => {
                if let Some(flyer) = state.spawners.flyers.get_mut(owner) {
                    flyer.behavior.revert();
                }
            }
        }
    }
}

/// Gravity, terminal velocity and horizontal steering
fn advance_character(state: &mut GameState, input: &TickInput) {
    let tuning = &state.tuning.character;
    let character = &mut state.character;

    character.fall_velocity =
        (character.fall_velocity + tuning.gravity).max(tuning.terminal_velocity);

    let steer = input.movement.clamp_length_max(1.0) * tuning.steer_speed;
    let half_width = tuning.corridor_half_width;
    let position = &mut character.handle.position;
    position.x = (position.x + steer.x).clamp(-half_width, half_width);
    position.z = (position.z + steer.y).clamp(-half_width, half_width);
    // The round ends above the ground, so this only guards extreme tuning
    position.y = (position.y + character.fall_velocity).max(character.ground_level);
}

fn advance_flyers(state: &mut GameState, now: u64) {
    let character = state.character.position();
    for flyer in state.spawners.flyers.live_mut() {
        if let Some(delay) = flyer.behavior.step(
            &mut flyer.handle.position,
            character,
            &state.tuning.flyer,
            state.rng.as_mut(),
        ) {
            state
                .timers
                .schedule(flyer.handle.id, now + delay, FlyerTimer::Revert);
        }
    }
}

fn collision_pass(state: &mut GameState, now: u64) {
    let result = state.detector.detect(
        &state.character.handle,
        state.spawners.rings.live(),
        state.spawners.flyers.live(),
        now,
    );
    match result {
        Ok(Some(hit)) => state.apply_hit(hit),
        Ok(None) => {}
        Err(err) => log::debug!("Skipping collision pass: {}", err),
    }
}

/// Derived values hosts follow with the camera and ground plane
fn update_follow(state: &mut GameState) {
    state.camera_y = state.character.position().y + state.tuning.character.camera_offset;
    state.ground_follow_y = state.progression.ground_level();
}
