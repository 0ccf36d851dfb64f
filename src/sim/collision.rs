//! Character collision detection
//!
//! Every vertex of the character's collision mesh casts a ray along its
//! outward normal. A ray that meets a ring or flyer mesh closer than the
//! threshold is a hit. The detector's immunity guard keeps one physical
//! overlap from counting again on the following frames.

use glam::Vec3;

use super::entity::{EntityHandle, EntityId, Flyer, HasHandle, Ring};
use crate::error::GeometryError;
use crate::tuning::CollisionTuning;

/// Time-boxed flag suppressing repeated collision counting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImmunityGuard {
    closes_at: Option<u64>,
}

impl ImmunityGuard {
    pub fn is_open(&self) -> bool {
        self.closes_at.is_some()
    }

    /// Open the guard until `now_ms + duration_ms`. Only one window exists at
    /// a time; reopening replaces the deadline.
    pub fn open(&mut self, now_ms: u64, duration_ms: u64) {
        self.closes_at = Some(now_ms.saturating_add(duration_ms));
    }

    /// Close the guard once its deadline has passed; true if it closed now
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.closes_at {
            Some(deadline) if now_ms >= deadline => {
                self.closes_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.closes_at = None;
    }
}

/// What the character ran into this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionHit {
    Ring(EntityId),
    Flyer(EntityId),
}

/// Per-frame vertex-ray sweep with its own immunity guard
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    guard: ImmunityGuard,
    threshold: f32,
    immunity_ms: u64,
}

impl CollisionDetector {
    pub fn new(tuning: &CollisionTuning) -> Self {
        Self {
            guard: ImmunityGuard::default(),
            threshold: tuning.threshold,
            immunity_ms: tuning.immunity_ms,
        }
    }

    pub fn guard(&self) -> &ImmunityGuard {
        &self.guard
    }

    /// Frame-start timer check for the guard
    pub fn poll(&mut self, now_ms: u64) -> bool {
        self.guard.poll(now_ms)
    }

    pub fn reset(&mut self) {
        self.guard.clear();
    }

    /// Run one pass. `Ok(None)` covers the guard being open, the character
    /// mesh not being loaded yet and plain misses. Invalid character geometry
    /// is an `Err` the caller skips and retries next frame.
    pub fn detect(
        &mut self,
        character: &EntityHandle,
        rings: &[Ring],
        flyers: &[Flyer],
        now_ms: u64,
    ) -> Result<Option<CollisionHit>, GeometryError> {
        if self.guard.is_open() {
            return Ok(None);
        }
        let Some(mesh) = &character.mesh else {
            return Ok(None);
        };

        let rays = mesh.world_rays(&character.transform())?;
        for (origin, dir) in rays {
            let hit = if let Some(id) = self.nearest_within(origin, dir, rings) {
                Some(CollisionHit::Ring(id))
            } else {
                self.nearest_within(origin, dir, flyers)
                    .map(CollisionHit::Flyer)
            };
            if hit.is_some() {
                self.guard.open(now_ms, self.immunity_ms);
                return Ok(hit);
            }
        }
        Ok(None)
    }

    /// Closest target along the ray, if it lies under the threshold
    fn nearest_within<T: HasHandle>(&self, origin: Vec3, dir: Vec3, targets: &[T]) -> Option<EntityId> {
        targets
            .iter()
            .filter_map(|target| {
                let handle = target.handle();
                let mesh = handle.mesh.as_ref()?;
                let t = mesh.ray_distance(&handle.transform(), origin, dir)?;
                Some((handle.id, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .filter(|(_, t)| *t < self.threshold)
            .map(|(id, _)| id)
    }
}
