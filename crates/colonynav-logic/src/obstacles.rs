//! Obstacle query surface.
//!
//! Workers only avoid static geometry: *structures* (buildings, the main
//! depot) and *generic obstacles* (resource deposits, terrain blockers). Both
//! classes are queried through [`ObstacleQuery`]; [`ObstacleField`] is the
//! in-memory implementation the engine rebuilds from entity footprints.
//!
//! Every query takes an [`ExcludeSet`] holding the querying agent, its
//! workplace and its depot, so workers can walk up to (and into) the
//! buildings they serve.

use serde::{Deserialize, Serialize};

use crate::geometry::{Aabb, Shape, Vec2};

/// Identifier shared with the simulation's entity namespace.
pub type EntityId = u64;

/// The two independent obstacle categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleClass {
    /// Buildings and the main depot.
    Structure,
    /// Resource deposits and terrain blockers.
    Generic,
}

/// A static blocker and the area it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub class: ObstacleClass,
    pub shape: Shape,
}

impl Obstacle {
    pub fn structure(id: EntityId, shape: Shape) -> Self {
        Self {
            id,
            class: ObstacleClass::Structure,
            shape,
        }
    }

    pub fn generic(id: EntityId, shape: Shape) -> Self {
        Self {
            id,
            class: ObstacleClass::Generic,
            shape,
        }
    }

    /// Occupied-area bounds, the only geometry other entities may read.
    pub fn bounds(&self) -> Aabb {
        self.shape.bounds()
    }
}

/// Entities a query must ignore: {self, workplace, depot}.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    ids: [Option<EntityId>; 3],
}

impl ExcludeSet {
    pub fn for_agent(agent: EntityId, workplace: Option<EntityId>, depot: Option<EntityId>) -> Self {
        Self {
            ids: [Some(agent), workplace, depot],
        }
    }

    /// Exclude nothing (used by tests and tooling).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.iter().any(|e| *e == Some(id))
    }
}

/// First blocking contact along a cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    /// Outward surface normal at the contact.
    pub normal: Vec2,
    /// Distance from the cast origin to `point`.
    pub distance: f32,
    pub obstacle: EntityId,
    pub class: ObstacleClass,
}

/// Read-only obstacle queries used by planner, follower and stuck recovery.
pub trait ObstacleQuery {
    /// Nearest blocking hit of a circle cast from `a` to `b`.
    fn cast(&self, a: Vec2, b: Vec2, exclude: &ExcludeSet) -> Option<RayHit>;

    /// Whether a circle of `radius` at `point` overlaps any blocker.
    fn area_has_blocker(&self, point: Vec2, radius: f32, exclude: &ExcludeSet) -> bool;

    fn is_segment_clear(&self, a: Vec2, b: Vec2, exclude: &ExcludeSet) -> bool {
        self.cast(a, b, exclude).is_none()
    }

    fn find_nearest_blocker(&self, a: Vec2, b: Vec2, exclude: &ExcludeSet) -> Option<Vec2> {
        self.cast(a, b, exclude).map(|hit| hit.point)
    }

    /// Free distance along `direction`, capped at `max_dist`.
    fn probe_clearance(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_dist: f32,
        exclude: &ExcludeSet,
    ) -> f32 {
        let dir = direction.normalize();
        if dir.is_near_zero() {
            return 0.0;
        }
        match self.cast(origin, origin + dir * max_dist, exclude) {
            Some(hit) => hit.distance,
            None => max_dist,
        }
    }
}

/// Flat list of obstacles, cast against with a fixed clearance radius.
///
/// Casts sweep a circle of `clearance` radius, so rect obstacles present
/// rounded corners. An obstacle the swept circle already overlaps at the
/// cast origin is ignored by that cast, the same way physics casts skip
/// colliders they start inside; area queries still report it.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    clearance: f32,
    structures_enabled: bool,
    generic_enabled: bool,
}

impl ObstacleField {
    pub fn new(clearance: f32) -> Self {
        Self {
            obstacles: Vec::new(),
            clearance,
            structures_enabled: true,
            generic_enabled: true,
        }
    }

    pub fn with_obstacles(clearance: f32, obstacles: impl IntoIterator<Item = Obstacle>) -> Self {
        let mut field = Self::new(clearance);
        for o in obstacles {
            field.insert(o);
        }
        field
    }

    /// Add an obstacle, replacing any previous one with the same id.
    pub fn insert(&mut self, obstacle: Obstacle) {
        self.remove(obstacle.id);
        self.obstacles.push(obstacle);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Obstacle> {
        let idx = self.obstacles.iter().position(|o| o.id == id)?;
        Some(self.obstacles.swap_remove(idx))
    }

    pub fn get(&self, id: EntityId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn clearance(&self) -> f32 {
        self.clearance
    }

    /// Turn one obstacle class on or off for every query.
    pub fn set_class_enabled(&mut self, class: ObstacleClass, enabled: bool) {
        match class {
            ObstacleClass::Structure => self.structures_enabled = enabled,
            ObstacleClass::Generic => self.generic_enabled = enabled,
        }
    }

    fn active<'a>(&'a self, exclude: &'a ExcludeSet) -> impl Iterator<Item = &'a Obstacle> + 'a {
        self.obstacles.iter().filter(move |o| {
            let class_on = match o.class {
                ObstacleClass::Structure => self.structures_enabled,
                ObstacleClass::Generic => self.generic_enabled,
            };
            class_on && !exclude.contains(o.id)
        })
    }
}

impl ObstacleQuery for ObstacleField {
    fn cast(&self, a: Vec2, b: Vec2, exclude: &ExcludeSet) -> Option<RayHit> {
        let length = a.distance(b);
        let mut best: Option<(f32, Vec2, &Obstacle)> = None;
        for o in self.active(exclude) {
            if o.shape.contains(a) || o.shape.overlaps_circle(a, self.clearance) {
                continue;
            }
            if let Some((t, normal)) = o.shape.swept_entry(a, b, self.clearance) {
                if best.map_or(true, |(bt, _, _)| t < bt) {
                    best = Some((t, normal, o));
                }
            }
        }
        best.map(|(t, normal, o)| RayHit {
            point: a + (b - a) * t,
            normal,
            distance: length * t,
            obstacle: o.id,
            class: o.class,
        })
    }

    fn area_has_blocker(&self, point: Vec2, radius: f32, exclude: &ExcludeSet) -> bool {
        self.active(exclude)
            .any(|o| o.shape.overlaps_circle(point, radius))
    }
}
