//! ColonyNav Headless Simulation Harness
//!
//! Runs navigation and work-cycle scenarios through the colony engine and
//! reports what happened. No rendering, no input, fixed seeds.
//!
//! Usage:
//!   cargo run -p colonynav-simtest
//!   cargo run -p colonynav-simtest -- --verbose

use std::collections::{HashMap, HashSet};

use colonynav_core::prelude::*;
use colonynav_core::scenario::load_scenario;
use colonynav_core::settings::load_config;
use colonynav_logic::config::{validate_config, NavConfig, PlannerConfig};
use colonynav_logic::diagnostics::DiagnosticEvent;
use colonynav_logic::obstacles::{ExcludeSet, Obstacle, ObstacleField, ObstacleQuery};
use colonynav_logic::planner::{plan_path, PlanKind};
use colonynav_logic::stuck::StuckState;
use hecs::Entity;
use log::{LevelFilter, Log, Metadata, Record};

// ── Crowded colony layout (shared with the engine tests) ────────────────
const SCENARIO_JSON: &str = include_str!("../../../data/colony_scenario.json");

const DT: f32 = 0.05;

// ── Logging ─────────────────────────────────────────────────────────────

struct StdoutLogger;

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("    [{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StdoutLogger = StdoutLogger;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    if verbose && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
    println!("=== ColonyNav Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Configuration defaults and validation
    results.extend(validate_config_handling(verbose));

    // 2. Planner on a synthetic field
    results.extend(validate_planner(verbose));

    // 3. Open field walk
    results.extend(validate_open_field(verbose));

    // 4. Detour around a deposit
    results.extend(validate_detour(verbose));

    // 5. Pinned worker
    results.extend(validate_pinned_worker(verbose));

    // 6. Full work cycle
    results.extend(validate_work_cycle(verbose));

    // 7. Crowded colony from JSON
    results.extend(validate_crowded_colony(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Shared helpers ──────────────────────────────────────────────────────

/// One worker at the origin, a workplace 11 units east and a depot 5 units west.
struct Lane {
    engine: ColonyEngine,
    worker: Entity,
    workplace: Entity,
    depot: Entity,
    events: Vec<DiagnosticEvent>,
}

impl Lane {
    fn new(seed: u64) -> Self {
        let mut engine = ColonyEngine::with_config(NavConfig::default(), seed);
        let workplace = engine.spawn_workplace(
            Vec2::new(11.0, 0.0),
            Vec2::new(2.0, 2.0),
            ResourceKind::Wood,
            1,
            1.0,
        );
        let depot = engine.spawn_depot(Vec2::new(-5.0, 0.0), Vec2::new(2.0, 2.0));
        let worker = engine.spawn_worker(WorkerKind::Woodcutter, Vec2::ZERO);
        Self {
            engine,
            worker,
            workplace,
            depot,
            events: Vec::new(),
        }
    }

    /// Send the worker to its workplace. A refusal becomes a failed result.
    fn start(&mut self, section: &str) -> Result<(), TestResult> {
        self.engine
            .assign(self.worker, self.workplace)
            .map_err(|e| TestResult {
                name: format!("{}_setup", section),
                passed: false,
                detail: format!("assignment refused: {}", e),
            })
    }

    fn snapshot(&self) -> Option<AgentSnapshot> {
        self.engine.snapshot(self.worker).ok()
    }

    fn phase(&self) -> Option<Phase> {
        self.snapshot().map(|s| s.phase)
    }

    /// Step until `done` holds; returns the elapsed time when it did.
    fn run_until(&mut self, limit: f32, mut done: impl FnMut(&Self) -> bool) -> Option<f32> {
        let mut elapsed = 0.0;
        while elapsed < limit {
            self.engine.update(DT);
            elapsed += DT;
            self.events.extend(self.engine.drain_events());
            if done(self) {
                return Some(elapsed);
            }
        }
        None
    }

    fn count(&self, pred: impl Fn(&DiagnosticEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

fn fmt_time(t: Option<f32>) -> String {
    match t {
        Some(t) => format!("{:.2}s", t),
        None => "never".into(),
    }
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_config_handling(verbose: bool) -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    let issues = validate_config(&NavConfig::default());
    results.push(TestResult {
        name: "config_defaults_valid".into(),
        passed: issues.is_empty(),
        detail: format!("{} issues in defaults", issues.len()),
    });

    let partial = load_config(r#"{ "agent": { "speed": 3.0 }, "stuck": { "max_recovery_attempts": 5 } }"#);
    results.push(TestResult {
        name: "config_partial_json".into(),
        passed: partial
            .as_ref()
            .map(|c| c.agent.speed == 3.0 && c.stuck.max_recovery_attempts == 5 && c.agent.radius == 0.3)
            .unwrap_or(false),
        detail: "overrides applied, other fields default".into(),
    });

    let broken = load_config(r#"{ "agent": { "speed": -1.0, "radius": 0.0 } }"#);
    let message = broken.as_ref().err().map(|e| e.to_string()).unwrap_or_default();
    results.push(TestResult {
        name: "config_rejects_bad_values".into(),
        passed: message.contains("agent.speed") && message.contains("agent.radius"),
        detail: message.clone(),
    });

    if verbose {
        let json = serde_json::to_string_pretty(&NavConfig::default()).unwrap_or_default();
        println!("  Default config:\n{}", json);
    }

    results
}

// ── 2. Planner ──────────────────────────────────────────────────────────

fn validate_planner(verbose: bool) -> Vec<TestResult> {
    println!("--- Planner ---");
    let mut results = Vec::new();
    let config = PlannerConfig::default();
    let none = ExcludeSet::none();

    let field = ObstacleField::with_obstacles(
        0.3,
        [Obstacle::generic(
            1,
            Shape::Circle {
                center: Vec2::new(5.0, 0.0),
                radius: 1.0,
            },
        )],
    );

    let clear = plan_path(Vec2::new(0.0, 4.0), Vec2::new(10.0, 4.0), &field, &none, &config);
    results.push(TestResult {
        name: "planner_direct".into(),
        passed: clear.kind == PlanKind::Direct && clear.path.len() == 1,
        detail: format!("{:?} with {} waypoint(s)", clear.kind, clear.path.len()),
    });

    let start = Vec2::ZERO;
    let target = Vec2::new(10.0, 0.0);
    let detour = plan_path(start, target, &field, &none, &config);
    let legs_clear = detour.path.waypoints().first().is_some_and(|mid| {
        field.is_segment_clear(start, *mid, &none) && field.is_segment_clear(*mid, target, &none)
    });
    results.push(TestResult {
        name: "planner_detour".into(),
        passed: detour.kind == PlanKind::Detour && legs_clear,
        detail: format!("{:?} via {:?}", detour.kind, detour.path.waypoints().first()),
    });

    let excluded = plan_path(start, target, &field, &ExcludeSet::for_agent(1, None, None), &config);
    results.push(TestResult {
        name: "planner_respects_exclusions".into(),
        passed: excluded.kind == PlanKind::Direct,
        detail: "excluded deposit is ignored".into(),
    });

    // A wall too long to get around within the detour budget
    let walled = ObstacleField::with_obstacles(
        0.3,
        [Obstacle::structure(2, Shape::Rect(Aabb::new(5.0, 0.0, 1.0, 60.0)))],
    );
    let fallback = plan_path(start, target, &walled, &none, &config);
    results.push(TestResult {
        name: "planner_fallback".into(),
        passed: fallback.kind == PlanKind::Fallback && fallback.path.len() == 2,
        detail: format!("{:?} with {} waypoints", fallback.kind, fallback.path.len()),
    });

    if verbose {
        println!("  Detour waypoints: {:?}", detour.path.waypoints());
        println!("  Fallback waypoints: {:?}", fallback.path.waypoints());
    }

    results
}

// ── 3. Open field ───────────────────────────────────────────────────────

fn validate_open_field(verbose: bool) -> Vec<TestResult> {
    println!("--- Open Field ---");
    let mut results = Vec::new();

    let mut lane = Lane::new(1);
    if let Err(failure) = lane.start("open_field") {
        results.push(failure);
        return results;
    }

    let mut plans = HashSet::new();
    let arrived = lane.run_until(10.0, |l| match l.snapshot() {
        Some(snap) => {
            plans.extend(snap.last_plan);
            snap.phase == Phase::Interacting
        }
        None => false,
    });

    // Approach point sits 0.5 outside the footprint edge at x = 10
    results.push(TestResult {
        name: "open_field_arrival".into(),
        passed: arrived.is_some_and(|t| t <= 5.5),
        detail: format!("9.5 units at speed 2 took {}", fmt_time(arrived)),
    });
    results.push(TestResult {
        name: "open_field_direct_route".into(),
        passed: plans.iter().all(|p| *p == PlanKind::Direct),
        detail: format!("plans used: {:?}", plans),
    });
    let stuck_events = lane.count(|e| matches!(e, DiagnosticEvent::StuckDetected { .. }));
    results.push(TestResult {
        name: "open_field_never_stuck".into(),
        passed: stuck_events == 0,
        detail: format!("{} stuck detections", stuck_events),
    });

    if verbose {
        for e in &lane.events {
            println!("  {}", e);
        }
    }

    results
}

// ── 4. Detour ───────────────────────────────────────────────────────────

fn validate_detour(verbose: bool) -> Vec<TestResult> {
    println!("--- Detour Around Deposit ---");
    let mut results = Vec::new();

    let mut lane = Lane::new(2);
    let deposit = Vec2::new(5.0, 0.0);
    lane.engine.spawn_obstacle(
        Shape::Circle {
            center: deposit,
            radius: 1.0,
        },
        ObstacleClass::Generic,
    );
    if let Err(failure) = lane.start("detour") {
        results.push(failure);
        return results;
    }

    let mut closest = f32::MAX;
    let mut plans = Vec::new();
    let arrived = lane.run_until(20.0, |l| {
        if let Some(snap) = l.snapshot() {
            closest = closest.min(snap.position.distance(deposit));
            if plans.last() != Some(&snap.last_plan) {
                plans.push(snap.last_plan);
            }
            snap.phase == Phase::Interacting
        } else {
            false
        }
    });

    results.push(TestResult {
        name: "detour_arrival".into(),
        passed: arrived.is_some(),
        detail: format!("arrived after {}", fmt_time(arrived)),
    });
    results.push(TestResult {
        name: "detour_planned".into(),
        passed: plans.first() == Some(&Some(PlanKind::Detour)),
        detail: format!("plan sequence {:?}", plans),
    });
    results.push(TestResult {
        name: "detour_keeps_clear".into(),
        passed: closest >= 1.0,
        detail: format!("closest approach to deposit center {:.2}", closest),
    });
    let stuck_events = lane.count(|e| matches!(e, DiagnosticEvent::StuckDetected { .. }));
    results.push(TestResult {
        name: "detour_no_stuck".into(),
        passed: stuck_events == 0,
        detail: format!("{} stuck detections", stuck_events),
    });

    if verbose {
        for e in &lane.events {
            println!("  {}", e);
        }
    }

    results
}

// ── 5. Pinned worker ────────────────────────────────────────────────────

/// Four walls leaving a pocket just wider than a worker.
fn cage(engine: &mut ColonyEngine, c: Vec2) -> Vec<Entity> {
    let walls = [
        Aabb::new(c.x - 0.81, c.y, 1.0, 3.0),
        Aabb::new(c.x + 0.81, c.y, 1.0, 3.0),
        Aabb::new(c.x, c.y - 0.81, 3.0, 1.0),
        Aabb::new(c.x, c.y + 0.81, 3.0, 1.0),
    ];
    walls
        .into_iter()
        .map(|w| engine.spawn_obstacle(Shape::Rect(w), ObstacleClass::Generic))
        .collect()
}

fn validate_pinned_worker(verbose: bool) -> Vec<TestResult> {
    println!("--- Pinned Worker ---");
    let mut results = Vec::new();

    // Temporary cage, removed once the worker is flagged
    let mut lane = Lane::new(3);
    let walls = cage(&mut lane.engine, Vec2::ZERO);
    if let Err(failure) = lane.start("pinned") {
        results.push(failure);
        return results;
    }

    let flagged = lane.run_until(5.0, |l| {
        l.snapshot().is_some_and(|s| s.stuck != StuckState::Clear && s.stuck != StuckState::Suspected)
    });
    results.push(TestResult {
        name: "pinned_detected".into(),
        passed: flagged.is_some_and(|t| t <= 2.6),
        detail: format!("flagged stuck after {}", fmt_time(flagged)),
    });

    for wall in walls {
        if let Err(e) = lane.engine.despawn(wall) {
            results.push(TestResult {
                name: "pinned_release".into(),
                passed: false,
                detail: format!("wall removal failed: {}", e),
            });
            return results;
        }
    }
    let cleared = lane.run_until(10.0, |l| {
        l.snapshot().is_some_and(|s| s.stuck == StuckState::Clear)
    });
    let recovered = lane.count(|e| matches!(e, DiagnosticEvent::Recovered { .. }));
    results.push(TestResult {
        name: "pinned_recovers".into(),
        passed: cleared.is_some() && recovered > 0,
        detail: format!("cleared {} after release, {} recoveries", fmt_time(cleared), recovered),
    });
    let arrived = lane.run_until(20.0, |l| l.phase() == Some(Phase::Interacting));
    results.push(TestResult {
        name: "pinned_resumes_work".into(),
        passed: arrived.is_some(),
        detail: format!("reached the workplace {} later", fmt_time(arrived)),
    });

    // Permanent cage: recovery must escalate to relocation
    let mut trapped = Lane::new(4);
    cage(&mut trapped.engine, Vec2::ZERO);
    if let Err(failure) = trapped.start("trapped") {
        results.push(failure);
        return results;
    }
    let relocated = trapped.run_until(30.0, |l| {
        l.events
            .iter()
            .any(|e| matches!(e, DiagnosticEvent::CriticalRelocation { .. }))
    });
    let escalations = trapped.count(|e| matches!(e, DiagnosticEvent::RecoveryEscalated { .. }));
    let timeouts = trapped.count(|e| matches!(e, DiagnosticEvent::LegTimedOut { .. }));
    results.push(TestResult {
        name: "pinned_relocation".into(),
        passed: relocated.is_some() && escalations == 2,
        detail: format!(
            "relocated after {} with {} escalations",
            fmt_time(relocated),
            escalations
        ),
    });
    results.push(TestResult {
        name: "pinned_leg_timer_paused".into(),
        passed: timeouts == 0,
        detail: format!("{} leg timeouts while stuck", timeouts),
    });

    if verbose {
        for e in &trapped.events {
            println!("  {}", e);
        }
    }

    results
}

// ── 6. Work cycle ───────────────────────────────────────────────────────

fn validate_work_cycle(verbose: bool) -> Vec<TestResult> {
    println!("--- Work Cycle ---");
    let mut results = Vec::new();

    let mut lane = Lane::new(5);
    let depot = lane.depot;
    if let Err(failure) = lane.start("cycle") {
        results.push(failure);
        return results;
    }

    let mut visited = Vec::new();
    let done = lane.run_until(90.0, |l| {
        if let Some(phase) = l.phase() {
            if visited.last() != Some(&phase) {
                visited.push(phase);
            }
        }
        l.count(|e| matches!(e, DiagnosticEvent::Delivered { .. })) >= 3
    });

    let stock = lane.engine.stockpile(depot).map(|s| s.count(ResourceKind::Wood)).unwrap_or(0);
    results.push(TestResult {
        name: "cycle_three_deliveries".into(),
        passed: done.is_some() && stock == 6,
        detail: format!("{} wood after {}", stock, fmt_time(done)),
    });

    let expected = [
        Phase::MovingToWorkplace,
        Phase::Interacting,
        Phase::MovingToDepot,
        Phase::Delivering,
        Phase::ReturningToWork,
        Phase::Interacting,
    ];
    results.push(TestResult {
        name: "cycle_phase_order".into(),
        passed: visited.starts_with(&expected),
        detail: visited
            .iter()
            .take(expected.len())
            .map(|p| p.label())
            .collect::<Vec<_>>()
            .join(" -> "),
    });

    let carrying = lane.snapshot().map(|s| s.carrying).unwrap_or(u32::MAX);
    results.push(TestResult {
        name: "cycle_inventory_emptied".into(),
        passed: carrying == 0,
        detail: format!("carrying {} after last delivery", carrying),
    });

    if verbose {
        let phases: Vec<_> = visited.iter().map(|p| p.label()).collect();
        println!("  Phase trace: {}", phases.join(" -> "));
    }

    results
}

// ── 7. Crowded colony ───────────────────────────────────────────────────

fn validate_crowded_colony(verbose: bool) -> Vec<TestResult> {
    println!("--- Crowded Colony ---");
    let mut results = Vec::new();

    let (mut engine, entities) = match load_scenario(SCENARIO_JSON) {
        Ok(loaded) => loaded,
        Err(e) => {
            results.push(TestResult {
                name: "crowded_load".into(),
                passed: false,
                detail: format!("scenario error: {}", e),
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "crowded_load".into(),
        passed: engine.worker_count() == entities.workers.len(),
        detail: format!(
            "{} workers, {} workplaces, {} depots, {} obstacles",
            entities.workers.len(),
            entities.workplaces.len(),
            entities.depots.len(),
            entities.obstacles.len()
        ),
    });

    let mut deliveries: HashMap<u64, u32> = HashMap::new();
    let mut stuck = 0usize;
    let mut relocations = 0usize;
    let mut fallbacks = 0usize;
    let mut peak_stuck = 0usize;
    let minutes = 3.0;
    for _ in 0..(minutes * 60.0 / DT) as usize {
        engine.update(DT);
        peak_stuck = peak_stuck.max(engine.last_stats().stuck);
        for event in engine.drain_events() {
            match event {
                DiagnosticEvent::Delivered { agent, .. } => *deliveries.entry(agent).or_insert(0) += 1,
                DiagnosticEvent::StuckDetected { .. } => stuck += 1,
                DiagnosticEvent::CriticalRelocation { .. } => relocations += 1,
                DiagnosticEvent::DetourFallback { .. } => fallbacks += 1,
                _ => {}
            }
        }
    }

    results.push(TestResult {
        name: "crowded_workers_deliver".into(),
        passed: deliveries.len() >= 10,
        detail: format!(
            "{}/{} workers delivered in {} minutes",
            deliveries.len(),
            entities.workers.len(),
            minutes
        ),
    });

    let total = engine.total_stockpile();
    let missing: Vec<_> = ResourceKind::all()
        .iter()
        .filter(|k| total.count(**k) == 0)
        .map(|k| k.label())
        .collect();
    results.push(TestResult {
        name: "crowded_all_resources".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            format!("{} resources stockpiled", total.total())
        } else {
            format!("nothing delivered for {}", missing.join(", "))
        },
    });

    results.push(TestResult {
        name: "crowded_stuck_is_rare".into(),
        passed: peak_stuck * 2 < entities.workers.len(),
        detail: format!(
            "{} detections, {} relocations, {} fallback detours, peak {} stuck at once",
            stuck, relocations, fallbacks, peak_stuck
        ),
    });

    if verbose {
        println!("  Stockpile:");
        for (kind, count) in total.iter() {
            println!("    {:<6} {}", kind.label(), count);
        }
        let counts = engine.phase_counts();
        println!("  Phases at end:");
        for phase in Phase::all() {
            println!("    {:<20} {}", phase.label(), counts.get(phase).copied().unwrap_or(0));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_assignment_becomes_a_failed_result() {
        let mut lane = Lane::new(1);
        lane.engine.despawn(lane.workplace).unwrap();
        let failure = lane.start("detour").unwrap_err();
        assert_eq!(failure.name, "detour_setup");
        assert!(!failure.passed);
        assert!(failure.detail.contains("assignment refused"));
        assert!(lane.start("detour").is_err());
    }
}
