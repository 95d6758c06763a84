//! Read-only views of the world used by navigation: the obstacle field and
//! the target footprint table.

use std::collections::HashMap;

use colonynav_logic::geometry::Aabb;
use colonynav_logic::obstacles::{EntityId, Obstacle, ObstacleField};
use hecs::World;

use crate::components::{entity_id, Depot, Footprint, Workplace};

/// Build an obstacle field from every entity with a [`Footprint`].
pub fn build_obstacle_field(world: &World, clearance: f32) -> ObstacleField {
    let obstacles = world
        .query::<&Footprint>()
        .iter()
        .map(|(entity, fp)| Obstacle {
            id: entity_id(entity),
            class: fp.class,
            shape: fp.shape,
        })
        .collect::<Vec<_>>();
    ObstacleField::with_obstacles(clearance, obstacles)
}

/// Footprints of every workplace and depot, keyed by navigation id.
pub fn collect_targets(world: &World) -> HashMap<EntityId, Aabb> {
    let mut targets = HashMap::new();
    for (entity, (fp, _)) in world.query::<(&Footprint, &Workplace)>().iter() {
        targets.insert(entity_id(entity), fp.bounds());
    }
    for (entity, (fp, _)) in world.query::<(&Footprint, &Depot)>().iter() {
        targets.insert(entity_id(entity), fp.bounds());
    }
    targets
}
