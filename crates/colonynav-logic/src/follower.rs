//! Path following with short-range reactive avoidance.
//!
//! The follower walks the cursor waypoint of the current [`Path`], or the raw
//! destination when there is none. Every tick a short probe is cast along the
//! desired heading; on a hit the worker blends toward the obstacle tangent and
//! holds that vector for a brief cooldown before steering directly again.
//!
//! Arrival at the destination is decided by the caller, not here.

use crate::config::{FollowerConfig, PlannerConfig};
use crate::geometry::{Vec2, EPSILON};
use crate::motion::Body;
use crate::obstacles::{ExcludeSet, ObstacleQuery};
use crate::path::Path;
use crate::planner::{plan_path, PlanKind, ReplanClock};

/// Held avoidance vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avoidance {
    pub direction: Vec2,
    pub remaining: f32,
}

/// What a single follower step did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FollowStep {
    /// Distance actually travelled.
    pub moved: f32,
    /// The step used an avoidance vector instead of the direct heading.
    pub deflected: bool,
    pub waypoint_reached: bool,
}

/// Per-worker route state: path, replan clock and avoidance cooldown.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    path: Path,
    clock: ReplanClock,
    avoidance: Option<Avoidance>,
    last_plan: Option<PlanKind>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn avoidance(&self) -> Option<Avoidance> {
        self.avoidance
    }

    /// Branch that produced the current route.
    pub fn last_plan(&self) -> Option<PlanKind> {
        self.last_plan
    }

    /// Drop the route and avoidance so the next tick replans from scratch.
    pub fn clear(&mut self) {
        self.path.clear();
        self.clock.invalidate();
        self.avoidance = None;
        self.last_plan = None;
    }

    /// Recompute the route when the replan clock says so. Returns the branch
    /// used when a plan was made this tick.
    pub fn replan_if_needed<Q: ObstacleQuery + ?Sized>(
        &mut self,
        start: Vec2,
        target: Vec2,
        query: &Q,
        exclude: &ExcludeSet,
        config: &PlannerConfig,
        dt: f32,
    ) -> Option<PlanKind> {
        self.clock.tick(dt);
        if !config.enabled {
            self.path.clear();
            return None;
        }
        if !self.clock.is_due(target, &self.path, config) {
            return None;
        }
        let outcome = plan_path(start, target, query, exclude, config);
        self.path = outcome.path;
        self.clock.mark_planned(target);
        self.last_plan = Some(outcome.kind);
        Some(outcome.kind)
    }

    /// Move `body` one tick toward the cursor waypoint (or `target`).
    ///
    /// The look-ahead cast runs with and without a path: fallback waypoints
    /// are never checked for clearance, so following one can still run into
    /// an obstacle.
    #[allow(clippy::too_many_arguments)]
    pub fn advance<Q: ObstacleQuery + ?Sized>(
        &mut self,
        body: &mut Body,
        target: Vec2,
        speed: f32,
        query: &Q,
        exclude: &ExcludeSet,
        config: &FollowerConfig,
        dt: f32,
    ) -> FollowStep {
        let mut step = FollowStep::default();
        let goal = self.path.current().unwrap_or(target);
        let to_goal = goal - body.position;
        let dist = to_goal.length();

        if dist > EPSILON {
            let desired = to_goal * (1.0 / dist);
            let heading = self.heading(body.position, desired, dist, query, exclude, config, dt);
            let max_step = speed * dt;
            let next = match heading {
                Some(dir) => {
                    step.deflected = true;
                    body.position + dir * max_step
                }
                None => body.position.move_toward(goal, max_step),
            };
            step.moved = body.step_to(next, query, exclude);
        }

        if let Some(waypoint) = self.path.current() {
            if body.position.distance(waypoint) <= config.snap_radius {
                self.path.advance();
                step.waypoint_reached = true;
            }
        }
        step
    }

    /// Avoidance heading for this tick, or `None` to steer directly.
    #[allow(clippy::too_many_arguments)]
    fn heading<Q: ObstacleQuery + ?Sized>(
        &mut self,
        position: Vec2,
        desired: Vec2,
        dist: f32,
        query: &Q,
        exclude: &ExcludeSet,
        config: &FollowerConfig,
        dt: f32,
    ) -> Option<Vec2> {
        if let Some(held) = self.avoidance.as_mut() {
            let direction = held.direction;
            held.remaining -= dt;
            if held.remaining <= 0.0 {
                self.avoidance = None;
            }
            return Some(direction);
        }

        let probe = config.probe_distance.min(dist);
        let hit = query.cast(position, position + desired * probe, exclude)?;
        let mut tangent = hit.normal.perp();
        if tangent.dot(desired) < 0.0 {
            tangent = -tangent;
        }
        let blended = (tangent * config.avoid_blend + desired * (1.0 - config.avoid_blend)).normalize();
        let direction = if blended.is_near_zero() { tangent } else { blended };
        self.avoidance = Some(Avoidance {
            direction,
            remaining: config.avoid_duration,
        });
        Some(direction)
    }
}
