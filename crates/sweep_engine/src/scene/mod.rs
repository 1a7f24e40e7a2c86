//! Scene container
//!
//! Entities live in a slot map addressed by [`EntityId`]; a separate
//! insertion-ordered id list gives every pass the same deterministic
//! iteration order. Animations hold ids, never references.

pub mod entity;

pub use entity::Entity;

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::Mat4;
use crate::physics::PhysicsError;

new_key_type! {
    /// Stable handle to a scene entity
    pub struct EntityId;
}

/// Ordered collection of entities
#[derive(Debug, Default)]
pub struct Scene {
    entities: SlotMap<EntityId, Entity>,
    order: Vec<EntityId>,
}

impl Scene {
    /// Empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, computing its world data
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        entity.reset_matrix();
        let id = self.entities.insert(entity);
        self.order.push(id);
        id
    }

    /// Remove an entity, returning it
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.order.retain(|other| *other != id);
        Some(entity)
    }

    /// Deep copy an entity under a new name and id
    pub fn clone_entity(&mut self, source: EntityId, name: impl Into<String>) -> Result<EntityId, PhysicsError> {
        let mut copy = self.entities.get(source).ok_or(PhysicsError::MissingEntity(source))?.clone();
        copy.name = name.into();
        Ok(self.add_entity(copy))
    }

    /// Entity by id
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable entity by id
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// First entity with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.order.iter().copied().find(|id| self.entities[*id].name == name)
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.order.iter().map(move |id| (*id, &self.entities[*id]))
    }

    /// Ids in insertion order
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    /// Position of an entity in iteration order
    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the scene is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// World matrices of every visible entity, for the renderer
    pub fn world_transforms(&self) -> Vec<(EntityId, Mat4)> {
        self.iter()
            .filter(|(_, entity)| entity.visible)
            .map(|(id, entity)| (id, *entity.world_matrix()))
            .collect()
    }
}
