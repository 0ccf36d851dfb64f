//! Skyfall entry point
//!
//! Headless runner: drives the simulation with a fixed-step accumulator and
//! an autopilot that steers toward the next ring below. Usage:
//! `skyfall [tuning.json] [seconds]`

fn main() {
    env_logger::init();
    log::info!("Skyfall (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match skyfall::Tuning::from_path(std::path::Path::new(&path)) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("Falling back to default tuning: {}", err);
                skyfall::Tuning::default()
            }
        },
        None => skyfall::Tuning::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(120);

    headless::run(tuning, seconds);
}

mod headless {
    use glam::Vec2;

    use skyfall::consts::{MAX_SUBSTEPS, SIM_DT_MS};
    use skyfall::sim::{
        CollisionMesh, EntityKind, GameEvent, GamePhase, GameState, SeededRng, TickInput, tick,
    };
    use skyfall::{Tuning, horizontal};

    /// Host frame length in ms (slightly off the sim step to exercise the accumulator)
    const HOST_FRAME_MS: u64 = 17;

    pub fn run(tuning: Tuning, seconds: u64) {
        let seed = 0x5EED;
        let mut state = GameState::with_tuning(tuning, Box::new(SeededRng::new(seed)));

        // Stand-ins for the asset collaborator's meshes
        state.attach_character_mesh(CollisionMesh::cube(0.5));
        state.attach_category_mesh(EntityKind::Ring, CollisionMesh::annulus(1.0, 2.0, 16));
        state.attach_category_mesh(EntityKind::Flyer, CollisionMesh::cube(0.75));

        let mut accumulator = 0;
        let mut elapsed = 0;
        let mut spawned = 0usize;
        let mut removed = 0usize;

        while elapsed < seconds * 1000 {
            accumulator += HOST_FRAME_MS;
            elapsed += HOST_FRAME_MS;

            let mut substeps = 0;
            while accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
                let input = autopilot(&state);
                tick(&mut state, &input, SIM_DT_MS);
                accumulator -= SIM_DT_MS;
                substeps += 1;
            }

            for event in state.drain_events() {
                match event {
                    GameEvent::EntitySpawned { .. } => spawned += 1,
                    GameEvent::EntityRemoved { .. } => removed += 1,
                    GameEvent::RoundStarted { round } => {
                        log::info!("Round {} at {:.1}s", round, elapsed as f32 / 1000.0)
                    }
                    GameEvent::GameOver { score, round } => {
                        log::info!("Game over: score {} in round {}", score, round)
                    }
                    _ => {}
                }
            }

            if state.phase == GamePhase::GameOver {
                break;
            }
        }

        log::info!(
            "Finished after {} frames: round {}, score {}, health {}, {} spawned, {} removed, {} live",
            state.frame,
            state.round(),
            state.vitals.score,
            state.vitals.health,
            spawned,
            removed,
            state.spawners.live_count()
        );
    }

    /// Steer toward the nearest ring still below the character
    fn autopilot(state: &GameState) -> TickInput {
        let position = state.character.position();
        let movement = state
            .spawners
            .rings
            .live()
            .iter()
            .map(|ring| ring.handle.position)
            .filter(|ring| ring.y < position.y)
            .max_by(|a, b| a.y.total_cmp(&b.y))
            .map_or(Vec2::ZERO, |ring| {
                (horizontal(ring) - horizontal(position)).clamp_length_max(1.0)
            });
        TickInput {
            movement,
            ..Default::default()
        }
    }
}
