//! Component definitions for the colony ECS.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod sites;
mod workers;

pub use sites::*;
pub use workers::*;

use colonynav_logic::obstacles::EntityId;

/// Navigation-side id of an entity.
pub fn entity_id(entity: hecs::Entity) -> EntityId {
    entity.to_bits().get()
}

/// Entity behind a navigation-side id, if the bits are a valid handle.
pub fn entity_from_id(id: EntityId) -> Option<hecs::Entity> {
    hecs::Entity::from_bits(id)
}
