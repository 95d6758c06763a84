//! Worker body and obstacle-constrained stepping.
//!
//! Algorithm: "clamp then slide"
//! 1. If the end of the step is free, take it.
//! 2. Otherwise try each axis on its own (slide along the blocker).
//! 3. Otherwise stay put; the stuck detector notices the stall.
//!
//! A body that already overlaps a blocker (spawned inside, or dropped there
//! by relocation) is allowed to move freely so it can walk out.

use serde::{Deserialize, Serialize};

use crate::geometry::{Vec2, EPSILON};
use crate::obstacles::{ExcludeSet, ObstacleQuery};

/// Physical state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    /// Sprite flip: true while walking toward -X.
    pub facing_left: bool,
    pub radius: f32,
}

impl Body {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            facing_left: false,
            radius,
        }
    }

    /// Update the flip flag from a movement direction. Purely vertical
    /// movement keeps the previous facing.
    pub fn face(&mut self, direction: Vec2) {
        if direction.x < -EPSILON {
            self.facing_left = true;
        } else if direction.x > EPSILON {
            self.facing_left = false;
        }
    }

    /// Step toward `to`, resolving against obstacles. Returns the distance
    /// actually travelled.
    pub fn step_to<Q: ObstacleQuery + ?Sized>(
        &mut self,
        to: Vec2,
        query: &Q,
        exclude: &ExcludeSet,
    ) -> f32 {
        let from = self.position;
        let resolved = resolve_step(from, to, self.radius, query, exclude);
        self.face(resolved - from);
        self.position = resolved;
        from.distance(resolved)
    }
}

/// Where a body of `radius` moving from `from` to `to` actually ends up.
pub fn resolve_step<Q: ObstacleQuery + ?Sized>(
    from: Vec2,
    to: Vec2,
    radius: f32,
    query: &Q,
    exclude: &ExcludeSet,
) -> Vec2 {
    if !query.area_has_blocker(to, radius, exclude) || query.area_has_blocker(from, radius, exclude)
    {
        return to;
    }
    let slide_x = Vec2::new(to.x, from.y);
    if (slide_x.x - from.x).abs() > EPSILON && !query.area_has_blocker(slide_x, radius, exclude) {
        return slide_x;
    }
    let slide_y = Vec2::new(from.x, to.y);
    if (slide_y.y - from.y).abs() > EPSILON && !query.area_has_blocker(slide_y, radius, exclude) {
        return slide_y;
    }
    from
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Aabb, Shape};
    use crate::obstacles::{Obstacle, ObstacleField};

    fn wall() -> ObstacleField {
        // Vertical wall occupying x in [2, 3]
        ObstacleField::with_obstacles(
            0.0,
            [Obstacle::structure(
                1,
                Shape::Rect(Aabb::new(2.5, 0.0, 1.0, 20.0)),
            )],
        )
    }

    #[test]
    fn free_step_is_taken() {
        let f = wall();
        let p = resolve_step(Vec2::ZERO, Vec2::new(0.5, 0.5), 0.3, &f, &ExcludeSet::none());
        assert_eq!(p, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn blocked_diagonal_slides_along_wall() {
        let f = wall();
        let from = Vec2::new(1.6, 0.0);
        let p = resolve_step(from, Vec2::new(1.9, 0.5), 0.3, &f, &ExcludeSet::none());
        assert_eq!(p, Vec2::new(1.6, 0.5));
    }

    #[test]
    fn head_on_is_stopped() {
        let f = wall();
        let from = Vec2::new(1.6, 0.0);
        let p = resolve_step(from, Vec2::new(1.9, 0.0), 0.3, &f, &ExcludeSet::none());
        assert_eq!(p, from);
    }

    #[test]
    fn excluded_building_does_not_block() {
        let f = wall();
        let from = Vec2::new(1.6, 0.0);
        let ex = ExcludeSet::for_agent(9, Some(1), None);
        assert_eq!(
            resolve_step(from, Vec2::new(2.5, 0.0), 0.3, &f, &ex),
            Vec2::new(2.5, 0.0)
        );
    }

    #[test]
    fn overlapping_body_can_walk_out() {
        let f = wall();
        let from = Vec2::new(2.5, 0.0);
        let p = resolve_step(from, Vec2::new(2.7, 0.0), 0.3, &f, &ExcludeSet::none());
        assert_eq!(p, Vec2::new(2.7, 0.0));
    }

    #[test]
    fn facing_follows_horizontal_motion() {
        let f = ObstacleField::new(0.0);
        let mut body = Body::new(Vec2::ZERO, 0.3);
        body.step_to(Vec2::new(-1.0, 0.0), &f, &ExcludeSet::none());
        assert!(body.facing_left);
        body.step_to(Vec2::new(-1.0, 2.0), &f, &ExcludeSet::none());
        assert!(body.facing_left, "vertical move keeps facing");
        let moved = body.step_to(Vec2::new(0.0, 2.0), &f, &ExcludeSet::none());
        assert!(!body.facing_left);
        assert!((moved - 1.0).abs() < 1e-6);
    }
}
