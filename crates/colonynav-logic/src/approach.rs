//! Approach point selection around workplace and depot footprints.
//!
//! Candidates are the nearest point on the footprint outline plus the four
//! side midpoints, each pushed outward by the standoff. Candidates whose area
//! is occupied are rejected; the rest are scored by
//! `distance - clearance_weight * local_clearance` and the lowest wins.

use std::collections::HashMap;

use crate::config::ApproachConfig;
use crate::geometry::{Aabb, Vec2};
use crate::obstacles::{EntityId, ExcludeSet, ObstacleQuery};

/// Resolves a workplace or depot id to its current footprint.
pub trait TargetLocator {
    fn bounds_of(&self, id: EntityId) -> Option<Aabb>;
}

impl TargetLocator for HashMap<EntityId, Aabb> {
    fn bounds_of(&self, id: EntityId) -> Option<Aabb> {
        self.get(&id).copied()
    }
}

/// Candidate approach points around `bounds` as seen from `from`.
pub fn approach_candidates(bounds: &Aabb, from: Vec2, standoff: f32) -> [Vec2; 5] {
    let edge = bounds.boundary_point(from);
    let center = bounds.center();
    [
        edge + bounds.outward_normal(edge) * standoff,
        Vec2::new(bounds.min_x() - standoff, center.y),
        Vec2::new(bounds.max_x() + standoff, center.y),
        Vec2::new(center.x, bounds.min_y() - standoff),
        Vec2::new(center.x, bounds.max_y() + standoff),
    ]
}

/// Best reachable point next to `bounds` for a worker of `radius` at `from`.
pub fn best_approach_point<Q: ObstacleQuery + ?Sized>(
    bounds: &Aabb,
    from: Vec2,
    query: &Q,
    exclude: &ExcludeSet,
    config: &ApproachConfig,
    radius: f32,
) -> Vec2 {
    let candidates = approach_candidates(bounds, from, config.standoff);

    let mut best: Option<(f32, Vec2)> = None;
    for candidate in candidates {
        if query.area_has_blocker(candidate, radius, exclude) {
            continue;
        }
        let clearance = [Vec2::X, -Vec2::X, Vec2::Y, -Vec2::Y]
            .into_iter()
            .map(|dir| query.probe_clearance(candidate, dir, config.clearance_probe, exclude))
            .fold(f32::INFINITY, f32::min);
        let score = candidate.distance(from) - config.clearance_weight * clearance;
        if best.map_or(true, |(s, _)| score < s) {
            best = Some((score, candidate));
        }
    }

    match best {
        Some((_, point)) => point,
        // Everything is occupied: fall back to plain distance
        None => candidates
            .into_iter()
            .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
            .unwrap_or(candidates[0]),
    }
}

/// Locate `target` and pick its approach point. `None` when the target no
/// longer exists.
pub fn locate_approach<L, Q>(
    locator: &L,
    target: EntityId,
    from: Vec2,
    query: &Q,
    exclude: &ExcludeSet,
    config: &ApproachConfig,
    radius: f32,
) -> Option<(Aabb, Vec2)>
where
    L: TargetLocator + ?Sized,
    Q: ObstacleQuery + ?Sized,
{
    let bounds = locator.bounds_of(target)?;
    let point = best_approach_point(&bounds, from, query, exclude, config, radius);
    Some((bounds, point))
}
