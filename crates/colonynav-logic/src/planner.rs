//! Local path planner: straight line, single detour, or blind fallback.
//!
//! Algorithm:
//! 1. Direct line of sight to the target → `[target]`.
//! 2. Otherwise pick the perpendicular side with more clearance and try one
//!    intermediate waypoint: first `start + side * avoidance_radius`, then
//!    the same offset from the blocking point, growing the offset up to
//!    `max_detour_steps` radii, then the other side. The first candidate
//!    whose two legs are clear wins → `[intermediate, target]`.
//! 3. No valid detour → `[start + side * avoidance_radius, target]` without
//!    any clearance check; the follower's reactive avoidance has to cope.
//!
//! There is no grid and no graph search; cost is a handful of casts.

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::geometry::Vec2;
use crate::obstacles::{ExcludeSet, ObstacleQuery};
use crate::path::Path;

/// Which branch of the planner produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Direct,
    Detour,
    /// Unvalidated perpendicular offset.
    Fallback,
}

/// A planned route and the branch that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub path: Path,
    pub kind: PlanKind,
}

/// Plan a short route from `start` to `target` around static obstacles.
pub fn plan_path<Q: ObstacleQuery + ?Sized>(
    start: Vec2,
    target: Vec2,
    query: &Q,
    exclude: &ExcludeSet,
    config: &PlannerConfig,
) -> PlanOutcome {
    let axis = (target - start).normalize();
    if axis.is_near_zero() || query.is_segment_clear(start, target, exclude) {
        return PlanOutcome {
            path: Path::new(vec![target]),
            kind: PlanKind::Direct,
        };
    }

    let blocker = query
        .find_nearest_blocker(start, target, exclude)
        .unwrap_or(start);
    let side = axis.perp();
    let left = query.probe_clearance(start, side, config.clearance_probe, exclude);
    let right = query.probe_clearance(start, -side, config.clearance_probe, exclude);
    let (preferred, other) = if left >= right {
        (side, -side)
    } else {
        (-side, side)
    };

    for dir in [preferred, other] {
        for step in 1..=config.max_detour_steps.max(1) {
            let offset = dir * (config.avoidance_radius * step as f32);
            for anchor in [start, blocker] {
                let waypoint = anchor + offset;
                if detour_is_clear(start, waypoint, target, query, exclude, config) {
                    let waypoints = vec![waypoint, target];
                    let waypoints = if config.smoothing {
                        smooth_waypoints(&waypoints, query, exclude)
                    } else {
                        waypoints
                    };
                    return PlanOutcome {
                        path: Path::new(waypoints),
                        kind: PlanKind::Detour,
                    };
                }
            }
        }
    }

    log::debug!(
        "no clear detour from ({:.1}, {:.1}) to ({:.1}, {:.1}), using fallback",
        start.x,
        start.y,
        target.x,
        target.y
    );
    PlanOutcome {
        path: Path::new(vec![start + preferred * config.avoidance_radius, target]),
        kind: PlanKind::Fallback,
    }
}

fn detour_is_clear<Q: ObstacleQuery + ?Sized>(
    start: Vec2,
    waypoint: Vec2,
    target: Vec2,
    query: &Q,
    exclude: &ExcludeSet,
    config: &PlannerConfig,
) -> bool {
    !query.area_has_blocker(waypoint, config.waypoint_clearance, exclude)
        && query.is_segment_clear(start, waypoint, exclude)
        && query.is_segment_clear(waypoint, target, exclude)
}

/// Greedy forward simplification.
///
/// An interior waypoint is dropped when the previous retained waypoint still
/// sees the waypoint after it. The first and last waypoints are always kept,
/// and routes of two or fewer are returned as is.
pub fn smooth_waypoints<Q: ObstacleQuery + ?Sized>(
    waypoints: &[Vec2],
    query: &Q,
    exclude: &ExcludeSet,
) -> Vec<Vec2> {
    if waypoints.len() <= 2 {
        return waypoints.to_vec();
    }
    let last = waypoints.len() - 1;
    let mut kept = vec![waypoints[0]];
    let mut anchor = waypoints[0];
    for i in 1..last {
        if query.is_segment_clear(anchor, waypoints[i + 1], exclude) {
            continue;
        }
        kept.push(waypoints[i]);
        anchor = waypoints[i];
    }
    kept.push(waypoints[last]);
    kept
}

/// Decides when a route must be recomputed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplanClock {
    planned_for: Option<Vec2>,
    since_plan: f32,
}

impl ReplanClock {
    pub fn tick(&mut self, dt: f32) {
        self.since_plan += dt;
    }

    /// True on the fixed interval, when the destination drifted, or when the
    /// current route has nothing left to walk.
    pub fn is_due(&self, target: Vec2, path: &Path, config: &PlannerConfig) -> bool {
        match self.planned_for {
            None => true,
            Some(planned) => {
                path.is_exhausted()
                    || self.since_plan >= config.replan_interval
                    || planned.distance(target) > config.replan_distance
            }
        }
    }

    pub fn mark_planned(&mut self, target: Vec2) {
        self.planned_for = Some(target);
        self.since_plan = 0.0;
    }

    /// Forget the last plan so the next check is always due.
    pub fn invalidate(&mut self) {
        self.planned_for = None;
        self.since_plan = 0.0;
    }
}
