//! Entities
//!
//! Every entity is an [`EntityHandle`] (id + transform + optional collision
//! mesh slot) composed with whatever category data it needs. The mesh slot is
//! filled by the asset collaborator whenever loading finishes.

use glam::{Affine3A, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::flyer::FlyerBehavior;
use super::mesh::CollisionMesh;

/// Stable entity identifier, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Entity categories, one spawn window each (the character has none)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Character,
    Ring,
    Flyer,
    Cloud,
    Terrain,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Character => "character",
            EntityKind::Ring => "ring",
            EntityKind::Flyer => "flyer",
            EntityKind::Cloud => "cloud",
            EntityKind::Terrain => "terrain",
        }
    }
}

/// Positionable handle shared by every entity
#[derive(Debug, Clone)]
pub struct EntityHandle {
    pub id: EntityId,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Absent until the asset collaborator attaches it (possibly forever)
    pub mesh: Option<CollisionMesh>,
}

impl EntityHandle {
    pub fn new(id: EntityId, position: Vec3) -> Self {
        Self {
            id,
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
        }
    }

    pub fn transform(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn has_collision(&self) -> bool {
        self.mesh.is_some()
    }
}

/// Access to the shared handle, implemented by every spawnable entity
pub trait HasHandle {
    const KIND: EntityKind;

    fn handle(&self) -> &EntityHandle;
    fn handle_mut(&mut self) -> &mut EntityHandle;

    fn id(&self) -> EntityId {
        self.handle().id
    }

    fn y(&self) -> f32 {
        self.handle().position.y
    }
}

/// The falling player character
#[derive(Debug, Clone)]
pub struct Character {
    pub handle: EntityHandle,
    /// Signed vertical velocity per frame (negative = falling)
    pub fall_velocity: f32,
    /// Ground depth for the current round
    pub ground_level: f32,
}

impl Character {
    pub fn new(id: EntityId, start_y: f32, ground_level: f32) -> Self {
        Self {
            handle: EntityHandle::new(id, Vec3::new(0.0, start_y, 0.0)),
            fall_velocity: 0.0,
            ground_level,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.handle.position
    }

    /// Move back to the session-start height (horizontal position resets too)
    pub fn reposition(&mut self, start_y: f32, ground_level: f32) {
        self.handle.position = Vec3::new(0.0, start_y, 0.0);
        self.fall_velocity = 0.0;
        self.ground_level = ground_level;
    }
}

/// Collectible ring
#[derive(Debug, Clone)]
pub struct Ring {
    pub handle: EntityHandle,
}

impl HasHandle for Ring {
    const KIND: EntityKind = EntityKind::Ring;

    fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut EntityHandle {
        &mut self.handle
    }
}

/// Hostile flyer
#[derive(Debug, Clone)]
pub struct Flyer {
    pub handle: EntityHandle,
    pub behavior: FlyerBehavior,
}

impl HasHandle for Flyer {
    const KIND: EntityKind = EntityKind::Flyer;

    fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut EntityHandle {
        &mut self.handle
    }
}

/// Decorative cloud bank (a batch of puffs around one anchor)
#[derive(Debug, Clone)]
pub struct Cloud {
    pub handle: EntityHandle,
    pub puffs: Vec<Piece>,
}

impl HasHandle for Cloud {
    const KIND: EntityKind = EntityKind::Cloud;

    fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut EntityHandle {
        &mut self.handle
    }
}

/// Background terrain cluster
#[derive(Debug, Clone)]
pub struct TerrainCluster {
    pub handle: EntityHandle,
    pub pieces: Vec<Piece>,
}

impl HasHandle for TerrainCluster {
    const KIND: EntityKind = EntityKind::Terrain;

    fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut EntityHandle {
        &mut self.handle
    }
}

/// One jittered piece of a batch, relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub offset: Vec3,
    pub scale: f32,
}

/// Hands out session-unique ids
#[derive(Debug, Clone)]
pub struct EntityIds {
    next: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}
