//! Windowed procedural spawning
//!
//! Every entity category uses the same [`SpawnWindow`]: entities are
//! pre-spawned one spacing step ahead of the falling character, culled once
//! the character has fallen past them, and generation stops just above the
//! ground. Categories differ only in parameters and in what they build at
//! each spawn point.

use glam::Vec3;

use super::entity::{
    Cloud, EntityHandle, EntityId, EntityIds, EntityKind, Flyer, HasHandle, Piece, Ring,
    TerrainCluster,
};
use super::flyer::FlyerBehavior;
use super::mesh::CollisionMesh;
use super::rng::SimRng;
use crate::tuning::{Tuning, WindowTuning};

/// Vertical lookahead spawner/culler for one entity category
#[derive(Debug, Clone)]
pub struct SpawnWindow<T> {
    params: WindowTuning,
    /// Session-start sentinel `next_spawn_y` returns to on reset
    start_y: f32,
    next_spawn_y: f32,
    ground_level: f32,
    /// Live entities in spawn order (so strictly decreasing Y)
    live: Vec<T>,
}

impl<T: HasHandle> SpawnWindow<T> {
    pub fn new(params: WindowTuning, start_y: f32, ground_level: f32) -> Self {
        debug_assert!(params.spacing > 0.0, "spawn spacing must be positive");
        Self {
            params,
            start_y,
            next_spawn_y: start_y,
            ground_level,
            live: Vec::new(),
        }
    }

    /// True iff a spawn at `candidate_y` is still above the stop line
    pub fn should_generate(&self, candidate_y: f32) -> bool {
        candidate_y > self.ground_level + self.params.stop_buffer
    }

    /// Y of the most recent live spawn, or just above the character if none
    fn last_y(&self, character_y: f32) -> f32 {
        self.live
            .last()
            .map_or(character_y + self.params.lookahead_margin, |e| e.y())
    }

    /// Window test without side effects
    pub fn wants_spawn(&self, character_y: f32) -> bool {
        let last_y = self.last_y(character_y);
        character_y <= last_y + self.params.spacing + self.params.lookahead_margin
            && self.should_generate(self.next_spawn_y - self.params.spacing)
    }

    /// Spawn at most one entity if the window calls for it
    pub fn try_generate<F>(
        &mut self,
        character_y: f32,
        ids: &mut EntityIds,
        rng: &mut dyn SimRng,
        build: F,
    ) -> Option<&T>
    where
        F: FnOnce(EntityHandle, &mut dyn SimRng) -> T,
    {
        if !self.wants_spawn(character_y) {
            return None;
        }
        let spacing = self.params.spacing;
        let candidate_y = self.next_spawn_y - spacing;
        let x = rng.symmetric(self.params.horizontal_range);
        let z = rng.symmetric(self.params.horizontal_range);
        // Upward jitter stays inside [candidate, next_spawn_y) so order holds
        let jitter = if self.params.vertical_jitter {
            rng.range(0.0, spacing)
        } else {
            0.0
        };
        let handle = EntityHandle::new(ids.next_id(), Vec3::new(x, candidate_y + jitter, z));
        let entity = build(handle, rng);
        self.next_spawn_y = candidate_y;
        log::debug!(
            "Spawned {} {:?} at y={:.1}",
            T::KIND.as_str(),
            entity.id(),
            entity.y()
        );
        self.live.push(entity);
        self.live.last()
    }

    /// Remove every entity more than the cull margin above the character
    pub fn cull_passed(&mut self, character_y: f32) -> Vec<EntityId> {
        let limit = character_y + self.params.cull_margin;
        let mut removed = Vec::new();
        self.live.retain(|e| {
            let passed = e.y() > limit;
            if passed {
                removed.push(e.id());
            }
            !passed
        });
        if !removed.is_empty() {
            log::debug!("Culled {} {} entities", removed.len(), T::KIND.as_str());
        }
        removed
    }

    /// Clear everything and rewind to the session start at a new ground level
    pub fn reset(&mut self, ground_level: f32) -> Vec<EntityId> {
        self.ground_level = ground_level;
        self.next_spawn_y = self.start_y;
        self.live.drain(..).map(|e| e.id()).collect()
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let index = self.live.iter().position(|e| e.id() == id)?;
        Some(self.live.remove(index))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.live.iter_mut().find(|e| e.id() == id)
    }

    pub fn live(&self) -> &[T] {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut [T] {
        &mut self.live
    }

    pub fn next_spawn_y(&self) -> f32 {
        self.next_spawn_y
    }

    pub fn ground_level(&self) -> f32 {
        self.ground_level
    }

    pub fn params(&self) -> &WindowTuning {
        &self.params
    }
}

/// Entity reported by a spawn or cull pass
pub type Spawned = (EntityKind, EntityId);

/// The four spawn windows plus the terrain floor bed
#[derive(Debug, Clone)]
pub struct Spawners {
    pub rings: SpawnWindow<Ring>,
    pub flyers: SpawnWindow<Flyer>,
    pub clouds: SpawnWindow<Cloud>,
    pub terrain: SpawnWindow<TerrainCluster>,
    /// Terrain pieces laid at the ground level (absolute positions)
    pub floor: Vec<Piece>,
    /// Collision meshes handed over by the asset collaborator
    ring_mesh: Option<CollisionMesh>,
    flyer_mesh: Option<CollisionMesh>,
}

impl Spawners {
    pub fn new(tuning: &Tuning, ground_level: f32, rng: &mut dyn SimRng) -> Self {
        let start_y = tuning.character.start_y;
        let mut spawners = Self {
            rings: SpawnWindow::new(tuning.rings.clone(), start_y, ground_level),
            flyers: SpawnWindow::new(tuning.flyers.clone(), start_y, ground_level),
            clouds: SpawnWindow::new(tuning.clouds.clone(), start_y, ground_level),
            terrain: SpawnWindow::new(tuning.terrain.clone(), start_y, ground_level),
            floor: Vec::new(),
            ring_mesh: None,
            flyer_mesh: None,
        };
        spawners.floor = lay_floor(&tuning.terrain, ground_level, rng);
        spawners
    }

    /// Run one spawn pass for every category. New rings are offered to the
    /// flyer window, which pairs at most one flyer with each.
    pub fn generate(
        &mut self,
        character_y: f32,
        round: u32,
        tuning: &Tuning,
        ids: &mut EntityIds,
        rng: &mut dyn SimRng,
    ) -> Vec<Spawned> {
        let mut spawned = Vec::new();

        let ring_mesh = self.ring_mesh.clone();
        let ring = self
            .rings
            .try_generate(character_y, ids, rng, |mut handle, _| {
                handle.mesh = ring_mesh;
                Ring { handle }
            })
            .map(|r| (r.id(), r.handle.position));

        if let Some((ring_id, ring_pos)) = ring {
            spawned.push((EntityKind::Ring, ring_id));
            let flyer_mesh = self.flyer_mesh.clone();
            if let Some(flyer) = self.flyers.try_generate(character_y, ids, rng, |mut handle, rng| {
                handle.mesh = flyer_mesh;
                build_flyer(handle, ring_pos, round, tuning, rng)
            }) {
                spawned.push((EntityKind::Flyer, flyer.id()));
            }
        }

        if let Some(cloud) = self.clouds.try_generate(character_y, ids, rng, |handle, rng| Cloud {
            puffs: scatter(&tuning.clouds, 2.0, rng),
            handle,
        }) {
            spawned.push((EntityKind::Cloud, cloud.id()));
        }

        if let Some(cluster) =
            self.terrain
                .try_generate(character_y, ids, rng, |handle, rng| TerrainCluster {
                    pieces: scatter(&tuning.terrain, 6.0, rng),
                    handle,
                })
        {
            spawned.push((EntityKind::Terrain, cluster.id()));
        }

        spawned
    }

    /// Cull every category against the character's depth
    pub fn cull(&mut self, character_y: f32) -> Vec<Spawned> {
        let tag = |kind: EntityKind| move |id: EntityId| (kind, id);
        let mut removed: Vec<Spawned> = Vec::new();
        removed.extend(self.rings.cull_passed(character_y).into_iter().map(tag(EntityKind::Ring)));
        removed.extend(self.flyers.cull_passed(character_y).into_iter().map(tag(EntityKind::Flyer)));
        removed.extend(self.clouds.cull_passed(character_y).into_iter().map(tag(EntityKind::Cloud)));
        removed.extend(
            self.terrain
                .cull_passed(character_y)
                .into_iter()
                .map(tag(EntityKind::Terrain)),
        );
        removed
    }

    /// Reset all four windows and re-lay the floor at the new ground level
    pub fn reset(&mut self, ground_level: f32, tuning: &Tuning, rng: &mut dyn SimRng) -> Vec<Spawned> {
        let tag = |kind: EntityKind| move |id: EntityId| (kind, id);
        let mut removed: Vec<Spawned> = Vec::new();
        removed.extend(self.rings.reset(ground_level).into_iter().map(tag(EntityKind::Ring)));
        removed.extend(self.flyers.reset(ground_level).into_iter().map(tag(EntityKind::Flyer)));
        removed.extend(self.clouds.reset(ground_level).into_iter().map(tag(EntityKind::Cloud)));
        removed.extend(self.terrain.reset(ground_level).into_iter().map(tag(EntityKind::Terrain)));
        self.floor = lay_floor(&tuning.terrain, ground_level, rng);
        removed
    }

    /// Install a category mesh: future spawns carry it and live entities get it now
    pub fn set_mesh(&mut self, kind: EntityKind, mesh: CollisionMesh) -> bool {
        match kind {
            EntityKind::Ring => {
                for ring in self.rings.live_mut() {
                    ring.handle.mesh = Some(mesh.clone());
                }
                self.ring_mesh = Some(mesh);
                true
            }
            EntityKind::Flyer => {
                for flyer in self.flyers.live_mut() {
                    flyer.handle.mesh = Some(mesh.clone());
                }
                self.flyer_mesh = Some(mesh);
                true
            }
            // Decoration never collides
            EntityKind::Character | EntityKind::Cloud | EntityKind::Terrain => false,
        }
    }

    pub fn live_count(&self) -> usize {
        self.rings.live().len()
            + self.flyers.live().len()
            + self.clouds.live().len()
            + self.terrain.live().len()
    }
}

/// Build a flyer paired with a freshly spawned ring
pub fn build_flyer(
    handle: EntityHandle,
    ring_pos: Vec3,
    round: u32,
    tuning: &Tuning,
    rng: &mut dyn SimRng,
) -> Flyer {
    let mut behavior = if rng.chance(0.5) {
        FlyerBehavior::track_target_point(handle.position, ring_pos, &tuning.flyer)
    } else {
        FlyerBehavior::track_character(&tuning.flyer)
    };
    behavior.set_velocity_for_round(round);
    Flyer { handle, behavior }
}

/// A jittered batch of pieces around an anchor
fn scatter(params: &WindowTuning, spread: f32, rng: &mut dyn SimRng) -> Vec<Piece> {
    (0..params.batch_size)
        .map(|_| {
            let offset = Vec3::new(
                rng.symmetric(spread),
                rng.symmetric(spread * 0.25),
                rng.symmetric(spread),
            );
            let scale = 1.0 + rng.symmetric(params.scale_jitter);
            Piece { offset, scale }
        })
        .collect()
}

/// Terrain bed the character lands toward at the end of a round
fn lay_floor(params: &WindowTuning, ground_level: f32, rng: &mut dyn SimRng) -> Vec<Piece> {
    scatter(params, params.horizontal_range, rng)
        .into_iter()
        .chain(scatter(params, params.horizontal_range, rng))
        .map(|piece| Piece {
            offset: Vec3::new(piece.offset.x, ground_level, piece.offset.z),
            scale: piece.scale,
        })
        .collect()
}
