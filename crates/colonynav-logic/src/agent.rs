//! A single worker and its per-tick update.
//!
//! Tick order: stuck detector → planner (when due) → follower → arrival check
//! → work cycle. While the detector owns the worker the follower does not run,
//! so only one of them ever moves the worker in a tick.

use rand::Rng;
use serde::Serialize;

use crate::approach::{locate_approach, TargetLocator};
use crate::config::NavConfig;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, RecoveryKind};
use crate::follower::Navigator;
use crate::geometry::{Aabb, Vec2};
use crate::inventory::Inventory;
use crate::motion::Body;
use crate::obstacles::{EntityId, ExcludeSet, ObstacleQuery};
use crate::planner::PlanKind;
use crate::stuck::{RecoveryEnv, StuckAction, StuckDetector, StuckState};
use crate::work_cycle::{CycleSignals, Phase, WorkBehavior, WorkCycle};

/// Shared, read-only world access for one tick.
pub struct TickEnv<'a> {
    pub obstacles: &'a dyn ObstacleQuery,
    pub targets: &'a dyn TargetLocator,
    pub config: &'a NavConfig,
    /// Simulation time in seconds.
    pub now: f64,
    pub dt: f32,
}

/// Summary of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    pub phase_before: Phase,
    pub phase_after: Phase,
    pub stuck_state: StuckState,
    /// Set when a route was (re)planned this tick.
    pub planned: Option<PlanKind>,
    pub moved: f32,
}

/// Cached approach point for the current leg.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Approach {
    target: EntityId,
    bounds: Aabb,
    point: Vec2,
}

#[derive(Debug, Clone)]
pub struct WorkerAgent {
    pub id: EntityId,
    pub body: Body,
    pub cycle: WorkCycle,
    pub inventory: Inventory,
    navigator: Navigator,
    stuck: StuckDetector,
    approach: Option<Approach>,
}

impl WorkerAgent {
    pub fn new(id: EntityId, position: Vec2, radius: f32) -> Self {
        Self {
            id,
            body: Body::new(position, radius),
            cycle: WorkCycle::new(),
            inventory: Inventory::new(),
            navigator: Navigator::new(),
            stuck: StuckDetector::new(position),
            approach: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.cycle.phase()
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn stuck(&self) -> &StuckDetector {
        &self.stuck
    }

    /// Approach point of the current leg, if one has been resolved.
    pub fn destination(&self) -> Option<Vec2> {
        self.approach.map(|a| a.point)
    }

    pub fn exclude_set(&self) -> ExcludeSet {
        ExcludeSet::for_agent(self.id, self.cycle.workplace(), self.cycle.depot())
    }

    /// Assign or reassign a workplace. Route and stuck state are discarded.
    pub fn assign(&mut self, workplace: EntityId) {
        self.cycle.assign_workplace(workplace);
        self.reset_navigation();
    }

    pub fn set_depot(&mut self, depot: Option<EntityId>) {
        self.cycle.set_depot(depot);
        self.approach = None;
    }

    /// Collapse to `Idle`, dropping route and stuck state.
    pub fn unassign(&mut self) {
        self.cycle.unassign();
        self.reset_navigation();
    }

    /// Move the worker directly, e.g. after an external teleport.
    pub fn place(&mut self, position: Vec2) {
        self.body.position = position;
        self.reset_navigation();
    }

    fn reset_navigation(&mut self) {
        self.navigator.clear();
        self.stuck.reset(self.body.position);
        self.approach = None;
    }

    /// Resolve the approach point of the current target, reusing the cached
    /// one while the target's footprint is unchanged.
    fn resolve_destination(&mut self, env: &TickEnv<'_>, exclude: &ExcludeSet) -> Option<Vec2> {
        let target = self.cycle.destination_target()?;
        let bounds = env.targets.bounds_of(target)?;
        if let Some(cached) = self.approach {
            if cached.target == target && cached.bounds == bounds {
                return Some(cached.point);
            }
        }
        let (bounds, point) = locate_approach(
            env.targets,
            target,
            self.body.position,
            env.obstacles,
            exclude,
            &env.config.approach,
            self.body.radius,
        )?;
        self.approach = Some(Approach {
            target,
            bounds,
            point,
        });
        Some(point)
    }

    /// Run one tick.
    pub fn tick<B, R>(
        &mut self,
        env: &TickEnv<'_>,
        behavior: &mut B,
        rng: &mut R,
        sink: &mut dyn DiagnosticSink,
    ) -> TickReport
    where
        B: WorkBehavior + ?Sized,
        R: Rng + ?Sized,
    {
        let config = env.config;
        let phase_before = self.cycle.phase();
        let start = self.body.position;
        let exclude = self.exclude_set();
        let moving = phase_before.is_moving();
        let destination = if moving {
            self.resolve_destination(env, &exclude)
        } else {
            self.approach = None;
            None
        };

        // 1. Stuck detector; only watches workers that are trying to travel
        let action = if destination.is_some() {
            self.stuck.update(
                &mut self.body,
                &RecoveryEnv {
                    query: env.obstacles,
                    exclude: &exclude,
                    destination,
                    speed: config.agent.speed,
                    now: env.now,
                    dt: env.dt,
                },
                rng,
                &config.stuck,
            )
        } else {
            StuckAction::None
        };
        match action {
            StuckAction::Detected { origin } => {
                self.navigator.clear();
                sink.emit(DiagnosticEvent::StuckDetected {
                    agent: self.id,
                    origin,
                    at: env.now,
                });
            }
            StuckAction::Recover {
                escalated: Some(attempt),
                ..
            } => sink.emit(DiagnosticEvent::RecoveryEscalated {
                agent: self.id,
                attempt,
            }),
            StuckAction::Relocate { to, fallback } => {
                self.navigator.clear();
                sink.emit(DiagnosticEvent::CriticalRelocation {
                    agent: self.id,
                    to,
                    blind: fallback,
                });
                sink.emit(DiagnosticEvent::Recovered {
                    agent: self.id,
                    via: RecoveryKind::Relocated,
                });
            }
            StuckAction::Recovered { .. } => {
                self.navigator.clear();
                sink.emit(DiagnosticEvent::Recovered {
                    agent: self.id,
                    via: RecoveryKind::Moved,
                });
            }
            StuckAction::Recover { .. } | StuckAction::None => {}
        }

        // 2-3. Planner and follower
        let mut planned = None;
        if moving && !action.owns_movement() {
            if let Some(dest) = destination {
                if config.planner.enabled {
                    planned = self.navigator.replan_if_needed(
                        self.body.position,
                        dest,
                        env.obstacles,
                        &exclude,
                        &config.planner,
                        env.dt,
                    );
                    if planned == Some(PlanKind::Fallback) {
                        sink.emit(DiagnosticEvent::DetourFallback {
                            agent: self.id,
                            from: self.body.position,
                            to: dest,
                        });
                    }
                }
                self.navigator.advance(
                    &mut self.body,
                    dest,
                    config.agent.speed,
                    env.obstacles,
                    &exclude,
                    &config.follower,
                    env.dt,
                );
            }
        }

        // 4. Arrival
        let arrived = moving
            && destination.map_or(false, |d| {
                self.body.position.distance(d) <= config.agent.interaction_radius
            });
        if arrived && self.stuck.is_stuck() {
            self.stuck.reset(self.body.position);
            sink.emit(DiagnosticEvent::Recovered {
                agent: self.id,
                via: RecoveryKind::Arrived,
            });
        }

        let outcome = self.cycle.advance(
            self.id,
            CycleSignals {
                arrived,
                stuck: self.stuck.is_stuck(),
            },
            behavior,
            &mut self.inventory,
            &config.cycle,
            env.dt,
            sink,
        );
        if outcome.phase_changed {
            self.reset_navigation();
        } else if outcome.restart_leg {
            self.navigator.clear();
            self.approach = None;
        }

        TickReport {
            phase_before,
            phase_after: self.cycle.phase(),
            stuck_state: self.stuck.state(),
            planned,
            moved: start.distance(self.body.position),
        }
    }
}
