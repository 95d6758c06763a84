//! Static colony geometry: workplaces, depots and blockers.

use colonynav_logic::geometry::{Aabb, Shape, Vec2};
use colonynav_logic::inventory::{Inventory, ResourceKind};
use colonynav_logic::obstacles::ObstacleClass;
use serde::{Deserialize, Serialize};

/// Occupied ground area of an entity. Every entity with a footprint is an
/// obstacle for workers that are not assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub shape: Shape,
    pub class: ObstacleClass,
}

impl Footprint {
    pub fn structure(shape: Shape) -> Self {
        Self {
            shape,
            class: ObstacleClass::Structure,
        }
    }

    pub fn generic(shape: Shape) -> Self {
        Self {
            shape,
            class: ObstacleClass::Generic,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.shape.bounds()
    }

    /// Same footprint re-centered on `center`.
    pub fn moved_to(&self, center: Vec2) -> Self {
        let shape = match self.shape {
            Shape::Rect(aabb) => Shape::Rect(Aabb {
                cx: center.x,
                cy: center.y,
                ..aabb
            }),
            Shape::Circle { radius, .. } => Shape::Circle { center, radius },
        };
        Self { shape, ..*self }
    }
}

/// A place workers harvest from (forest, quarry, field).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Workplace {
    pub resource: ResourceKind,
    /// Units produced per completed interaction before worker bonuses.
    pub base_yield: u32,
    /// Seconds of work per visit before worker pace is applied.
    pub interaction_time: f32,
}

/// A stockpile workers deliver to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub stockpile: Inventory,
    /// Closed depots refuse deliveries.
    pub accepting: bool,
}

impl Depot {
    pub fn open() -> Self {
        Self {
            stockpile: Inventory::new(),
            accepting: true,
        }
    }
}

/// Terrain or deposit that only blocks movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker;
