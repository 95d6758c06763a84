//! Integration tests for a single worker running the full tick loop.
//!
//! Exercises: approach → planner → follower → stuck detector → work cycle
//!
//! All tests are pure logic with a seeded RNG; no ECS involved.

use std::collections::HashMap;

use colonynav_logic::agent::{TickEnv, WorkerAgent};
use colonynav_logic::config::NavConfig;
use colonynav_logic::diagnostics::{DiagnosticEvent, RecoveryKind};
use colonynav_logic::geometry::{Aabb, Shape, Vec2};
use colonynav_logic::inventory::{Inventory, ResourceKind};
use colonynav_logic::obstacles::{EntityId, Obstacle, ObstacleField};
use colonynav_logic::planner::PlanKind;
use colonynav_logic::stuck::StuckState;
use colonynav_logic::work_cycle::{Phase, WorkBehavior};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Helpers ────────────────────────────────────────────────────────────

const WORKER: EntityId = 1;
const WORKPLACE: EntityId = 100;
const DEPOT: EntityId = 200;

struct Woodcutter {
    stockpile: Inventory,
    harvests: u32,
}

impl Woodcutter {
    fn new() -> Self {
        Self {
            stockpile: Inventory::new(),
            harvests: 0,
        }
    }
}

impl WorkBehavior for Woodcutter {
    fn interaction_time(&self) -> f32 {
        1.0
    }

    fn collect_resources(&mut self, _workplace: EntityId, inventory: &mut Inventory) {
        self.harvests += 1;
        inventory.add(ResourceKind::Wood, 2);
    }

    fn deliver_resources(&mut self, _depot: EntityId, inventory: &Inventory) -> bool {
        self.stockpile.merge(inventory);
        true
    }
}

/// Drives one worker with a fixed step, recording every diagnostic.
struct Sim {
    field: ObstacleField,
    targets: HashMap<EntityId, Aabb>,
    config: NavConfig,
    agent: WorkerAgent,
    behavior: Woodcutter,
    rng: StdRng,
    events: Vec<DiagnosticEvent>,
    now: f64,
    dt: f32,
}

impl Sim {
    fn new(field: ObstacleField, start: Vec2, dt: f32) -> Self {
        let config = NavConfig::default();
        Self {
            field,
            targets: HashMap::new(),
            agent: WorkerAgent::new(WORKER, start, config.agent.radius),
            config,
            behavior: Woodcutter::new(),
            rng: StdRng::seed_from_u64(42),
            events: Vec::new(),
            now: 0.0,
            dt,
        }
    }

    fn step(&mut self) -> colonynav_logic::agent::TickReport {
        self.now += self.dt as f64;
        let env = TickEnv {
            obstacles: &self.field,
            targets: &self.targets,
            config: &self.config,
            now: self.now,
            dt: self.dt,
        };
        self.agent
            .tick(&env, &mut self.behavior, &mut self.rng, &mut self.events)
    }

    /// Step until `done` holds or `limit` seconds pass; returns elapsed time.
    fn run_until(&mut self, limit: f64, mut done: impl FnMut(&Sim) -> bool) -> Option<f64> {
        let start = self.now;
        while self.now - start < limit {
            self.step();
            if done(self) {
                return Some(self.now - start);
            }
        }
        None
    }
}

/// Four walls 0.31 from `c`: a worker of radius 0.3 can barely twitch.
fn cage(c: Vec2) -> [Obstacle; 4] {
    [
        Obstacle::structure(11, Shape::Rect(Aabb::new(c.x - 0.81, c.y, 1.0, 3.0))),
        Obstacle::structure(12, Shape::Rect(Aabb::new(c.x + 0.81, c.y, 1.0, 3.0))),
        Obstacle::structure(13, Shape::Rect(Aabb::new(c.x, c.y - 0.81, 3.0, 1.0))),
        Obstacle::structure(14, Shape::Rect(Aabb::new(c.x, c.y + 0.81, 3.0, 1.0))),
    ]
}

// ── Walking ────────────────────────────────────────────────────────────

#[test]
fn ten_unit_walk_reaches_workplace_without_detour() {
    let mut sim = Sim::new(ObstacleField::new(0.3), Vec2::ZERO, 0.05);
    // Approach point lands at (10, 0)
    sim.targets.insert(WORKPLACE, Aabb::new(11.0, 0.0, 1.0, 1.0));
    sim.agent.assign(WORKPLACE);

    let mut plans = Vec::new();
    while sim.agent.phase() != Phase::Interacting {
        let report = sim.step();
        plans.extend(report.planned);
        assert!(sim.now <= 5.0, "not there after {}s", sim.now);
    }
    assert!(!plans.is_empty());
    assert!(plans.iter().all(|k| *k == PlanKind::Direct), "{plans:?}");
    assert!(sim.agent.position().distance(Vec2::new(10.0, 0.0)) <= 0.5 + 1e-4);
}

#[test]
fn detours_around_a_deposit() {
    let field = ObstacleField::with_obstacles(
        0.3,
        [Obstacle::generic(
            50,
            Shape::Circle {
                center: Vec2::new(5.0, 0.0),
                radius: 1.0,
            },
        )],
    );
    let mut sim = Sim::new(field, Vec2::ZERO, 0.05);
    sim.targets.insert(WORKPLACE, Aabb::new(11.0, 0.0, 1.0, 1.0));
    sim.agent.assign(WORKPLACE);

    let first = sim.step();
    assert_eq!(first.planned, Some(PlanKind::Detour));

    let arrived = sim.run_until(20.0, |s| s.agent.phase() == Phase::Interacting);
    assert!(arrived.is_some(), "stuck behind deposit at {:?}", sim.agent.position());
    assert!(!sim
        .events
        .iter()
        .any(|e| matches!(e, DiagnosticEvent::StuckDetected { .. })));
}

#[test]
fn cursor_never_moves_backwards() {
    let field = ObstacleField::with_obstacles(
        0.3,
        [Obstacle::generic(
            50,
            Shape::Rect(Aabb::new(5.0, 0.0, 2.0, 2.0)),
        )],
    );
    let mut sim = Sim::new(field, Vec2::ZERO, 0.05);
    sim.targets.insert(WORKPLACE, Aabb::new(11.0, 0.0, 1.0, 1.0));
    sim.agent.assign(WORKPLACE);

    let mut last_cursor = 0;
    let mut last_route = Vec::new();
    for _ in 0..200 {
        let report = sim.step();
        let path = sim.agent.navigator().path();
        let same_route = report.planned.is_none() && path.waypoints() == last_route.as_slice();
        if same_route {
            assert!(path.cursor() >= last_cursor);
        }
        assert!(path.cursor() <= path.len());
        last_cursor = path.cursor();
        last_route = path.waypoints().to_vec();
        if sim.agent.phase() == Phase::Interacting {
            break;
        }
    }
}

// ── Stuck handling ─────────────────────────────────────────────────────

#[test]
fn pinned_worker_is_flagged_then_recovers_after_release() {
    let field = ObstacleField::with_obstacles(0.3, cage(Vec2::ZERO));
    let mut sim = Sim::new(field, Vec2::ZERO, 0.25);
    sim.targets.insert(WORKPLACE, Aabb::new(11.0, 0.0, 1.0, 1.0));
    sim.agent.assign(WORKPLACE);

    let flagged = sim
        .run_until(10.0, |s| s.agent.stuck().is_stuck())
        .expect("never flagged");
    assert!(flagged <= 2.5, "flagged after {flagged}");
    assert!(sim
        .events
        .iter()
        .any(|e| matches!(e, DiagnosticEvent::StuckDetected { agent: WORKER, .. })));

    // Release: the cage disappears
    for id in 11..=14 {
        sim.field.remove(id);
    }
    let cleared = sim
        .run_until(9.0, |s| s.agent.stuck().state() == StuckState::Clear)
        .expect("never cleared");
    assert!(cleared <= 9.0);
    assert!(sim.events.iter().any(|e| matches!(
        e,
        DiagnosticEvent::Recovered {
            via: RecoveryKind::Moved | RecoveryKind::Arrived,
            ..
        }
    )));
    assert_eq!(sim.agent.stuck().attempts(), 0);
}

#[test]
fn permanently_pinned_worker_is_relocated_within_budget() {
    let field = ObstacleField::with_obstacles(0.3, cage(Vec2::ZERO));
    let mut sim = Sim::new(field, Vec2::ZERO, 0.25);
    sim.targets.insert(WORKPLACE, Aabb::new(11.0, 0.0, 1.0, 1.0));
    sim.agent.assign(WORKPLACE);

    sim.run_until(10.0, |s| s.agent.stuck().is_stuck())
        .expect("never flagged");
    let budget = {
        let s = &sim.config.stuck;
        s.max_recovery_attempts as f64 * s.attempt_window() as f64
    };
    let relocated = sim
        .run_until(budget + 0.5, |s| {
            s.events
                .iter()
                .any(|e| matches!(e, DiagnosticEvent::CriticalRelocation { .. }))
        })
        .expect("never relocated");
    assert!(relocated <= budget + 1e-6, "took {relocated}");
    let escalations = sim
        .events
        .iter()
        .filter(|e| matches!(e, DiagnosticEvent::RecoveryEscalated { .. }))
        .count();
    assert_eq!(escalations, 2);
    assert_eq!(sim.agent.stuck().state(), StuckState::Clear);
}

#[test]
fn stuck_worker_does_not_time_out_its_leg() {
    let field = ObstacleField::with_obstacles(0.3, cage(Vec2::ZERO));
    let mut sim = Sim::new(field, Vec2::ZERO, 0.25);
    sim.targets.insert(WORKPLACE, Aabb::new(11.0, 0.0, 1.0, 1.0));
    sim.agent.assign(WORKPLACE);
    sim.run_until(10.0, |s| s.agent.stuck().is_stuck())
        .expect("never flagged");
    let before = sim.agent.cycle.leg_elapsed();
    for _ in 0..8 {
        sim.step();
    }
    assert_eq!(sim.agent.cycle.leg_elapsed(), before);
    assert_eq!(sim.agent.phase(), Phase::MovingToWorkplace);
}

// ── Work cycle ─────────────────────────────────────────────────────────

#[test]
fn cycle_closes_and_zeroes_inventory_on_delivery() {
    let mut sim = Sim::new(ObstacleField::new(0.3), Vec2::ZERO, 0.05);
    sim.targets.insert(WORKPLACE, Aabb::new(8.0, 0.0, 1.0, 1.0));
    sim.targets.insert(DEPOT, Aabb::new(-4.0, 0.0, 2.0, 2.0));
    sim.agent.assign(WORKPLACE);
    sim.agent.set_depot(Some(DEPOT));

    let mut seen = Vec::new();
    let mut deliveries = 0;
    for _ in 0..2000 {
        let report = sim.step();
        if report.phase_after != report.phase_before {
            seen.push(report.phase_after);
        }
        if report.phase_before == Phase::Delivering {
            assert!(sim.agent.inventory.is_empty(), "delivery left cargo");
            deliveries += 1;
        }
        if deliveries == 2 {
            break;
        }
    }
    assert_eq!(deliveries, 2);
    assert_eq!(sim.behavior.stockpile.count(ResourceKind::Wood), 4);
    assert_eq!(sim.behavior.harvests, 2);
    for phase in [
        Phase::Interacting,
        Phase::MovingToDepot,
        Phase::Delivering,
        Phase::ReturningToWork,
    ] {
        assert!(seen.contains(&phase), "never entered {phase:?}");
    }
}

#[test]
fn reassignment_heads_for_the_new_workplace() {
    let mut sim = Sim::new(ObstacleField::new(0.3), Vec2::ZERO, 0.05);
    sim.targets.insert(WORKPLACE, Aabb::new(8.0, 0.0, 1.0, 1.0));
    sim.targets.insert(WORKPLACE + 1, Aabb::new(-8.0, 0.0, 1.0, 1.0));
    sim.agent.assign(WORKPLACE);
    for _ in 0..20 {
        sim.step();
    }
    assert!(sim.agent.position().x > 0.0);
    sim.agent.assign(WORKPLACE + 1);
    assert_eq!(sim.agent.phase(), Phase::MovingToWorkplace);
    sim.run_until(20.0, |s| s.agent.phase() == Phase::Interacting)
        .expect("never reached new workplace");
    assert!(sim.agent.position().x < -6.0);
}
