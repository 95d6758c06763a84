//! Integration tests for the colony engine.
//!
//! Exercises: scenario loading → engine update → depot stockpiles, plus the
//! entity API edge cases (moved, closed and removed sites).

use std::collections::HashSet;

use colonynav_core::prelude::*;
use colonynav_core::scenario::load_scenario;
use colonynav_logic::diagnostics::DiagnosticEvent;
use colonynav_logic::stuck::StuckState;
use hecs::Entity;

const CROWDED: &str = include_str!("../../../data/colony_scenario.json");

// ── Helpers ────────────────────────────────────────────────────────────

const DT: f32 = 0.05;

struct Colony {
    engine: ColonyEngine,
    forest: Entity,
    depot: Entity,
    worker: Entity,
    events: Vec<DiagnosticEvent>,
}

impl Colony {
    fn new() -> Self {
        let mut engine = ColonyEngine::with_config(Default::default(), 11);
        let forest = engine.spawn_workplace(
            Vec2::new(8.0, 0.0),
            Vec2::new(2.0, 2.0),
            ResourceKind::Wood,
            1,
            1.0,
        );
        let depot = engine.spawn_depot(Vec2::new(-4.0, 0.0), Vec2::new(2.0, 2.0));
        let worker = engine.spawn_worker(WorkerKind::Woodcutter, Vec2::ZERO);
        Self {
            engine,
            forest,
            depot,
            worker,
            events: Vec::new(),
        }
    }

    fn phase(&self) -> Phase {
        self.engine.snapshot(self.worker).unwrap().phase
    }

    /// Step until `done` holds or `limit` seconds pass. Returns whether
    /// `done` was reached.
    fn run_until(&mut self, limit: f32, mut done: impl FnMut(&Self) -> bool) -> bool {
        let steps = (limit / DT) as usize;
        for _ in 0..steps {
            self.engine.update(DT);
            let drained = self.engine.drain_events();
            self.events.extend(drained);
            if done(self) {
                return true;
            }
        }
        false
    }
}

// ── Crowded colony ─────────────────────────────────────────────────────

#[test]
fn crowded_colony_keeps_delivering() {
    let (mut engine, entities) = load_scenario(CROWDED).unwrap();
    assert_eq!(engine.worker_count(), 12);
    assert_eq!(engine.obstacle_count(), 4);

    let mut delivering = HashSet::new();
    for _ in 0..(180.0 / DT) as usize {
        engine.update(DT);
        for event in engine.drain_events() {
            if let DiagnosticEvent::Delivered { agent, .. } = event {
                delivering.insert(agent);
            }
        }
    }

    assert!(
        delivering.len() >= 10,
        "only {} of 12 workers delivered",
        delivering.len()
    );
    let total = engine.total_stockpile();
    for kind in ResourceKind::all() {
        assert!(total.count(*kind) > 0, "no {} delivered", kind.label());
    }
    let per_depot: u32 = entities
        .depots
        .iter()
        .map(|d| engine.stockpile(*d).unwrap().total())
        .sum();
    assert_eq!(per_depot, total.total());
}

#[test]
fn crowded_colony_is_deterministic() {
    let run = || {
        let (mut engine, _) = load_scenario(CROWDED).unwrap();
        for _ in 0..400 {
            engine.update(DT);
        }
        engine
            .snapshots()
            .into_iter()
            .map(|s| (s.position.x, s.position.y, s.phase))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

/// Two caged miners that keep rolling recovery directions. Returns their
/// snapshots keyed by cage, whichever one was spawned first.
fn caged_miners(west_first: bool) -> Vec<(Vec2, Phase, StuckState, bool)> {
    let mut engine = ColonyEngine::with_config(Default::default(), 9);
    let mine = engine.spawn_workplace(
        Vec2::new(12.0, 0.0),
        Vec2::new(2.0, 2.0),
        ResourceKind::Stone,
        1,
        2.0,
    );
    engine.spawn_depot(Vec2::new(0.0, -10.0), Vec2::new(2.0, 2.0));
    let cages = [Vec2::new(-3.0, 0.0), Vec2::new(3.0, 4.0)];
    for c in cages {
        for wall in [
            Aabb::new(c.x - 0.9, c.y, 0.6, 2.4),
            Aabb::new(c.x + 0.9, c.y, 0.6, 2.4),
            Aabb::new(c.x, c.y - 0.9, 2.4, 0.6),
            Aabb::new(c.x, c.y + 0.9, 2.4, 0.6),
        ] {
            engine.spawn_obstacle(Shape::Rect(wall), ObstacleClass::Generic);
        }
    }
    let order = if west_first { [0, 1] } else { [1, 0] };
    let mut miners = [None, None];
    for i in order {
        let miner = engine.spawn_worker(WorkerKind::Miner, cages[i]);
        engine.assign(miner, mine).unwrap();
        miners[i] = Some(miner);
    }
    for _ in 0..(26.0 / 0.25) as usize {
        engine.update(0.25);
    }
    miners
        .into_iter()
        .flatten()
        .map(|m| {
            let s = engine.snapshot(m).unwrap();
            (s.position, s.phase, s.stuck, s.facing_left)
        })
        .collect()
}

#[test]
fn spawn_order_does_not_change_movement() {
    let west_first = caged_miners(true);
    assert_eq!(west_first.len(), 2);
    assert_eq!(west_first, caged_miners(false));
}

// ── Site changes ───────────────────────────────────────────────────────

#[test]
fn moved_depot_is_followed() {
    let mut colony = Colony::new();
    colony.engine.assign(colony.worker, colony.forest).unwrap();
    assert!(colony.run_until(20.0, |c| c.phase() == Phase::MovingToDepot));

    let new_home = Vec2::new(0.0, 15.0);
    colony.engine.move_depot(colony.depot, new_home).unwrap();
    let depot = colony.depot;
    assert!(colony.run_until(30.0, |c| c.engine.stockpile(depot).unwrap().total() > 0));

    let snap = colony.engine.snapshot(colony.worker).unwrap();
    assert!(
        snap.position.distance(new_home) < 2.5,
        "delivered from {:?}",
        snap.position
    );
}

#[test]
fn closed_depot_keeps_the_load_until_reopened() {
    let mut colony = Colony::new();
    colony.engine.set_depot_accepting(colony.depot, false).unwrap();
    colony.engine.assign(colony.worker, colony.forest).unwrap();

    assert!(colony.run_until(30.0, |c| c
        .events
        .iter()
        .any(|e| matches!(e, DiagnosticEvent::DeliveryFailed { .. }))));
    let snap = colony.engine.snapshot(colony.worker).unwrap();
    assert_eq!(snap.phase, Phase::ReturningToWork);
    assert_eq!(snap.carrying, 2);
    assert_eq!(colony.engine.stockpile(colony.depot).unwrap().total(), 0);

    colony.engine.set_depot_accepting(colony.depot, true).unwrap();
    let depot = colony.depot;
    assert!(colony.run_until(40.0, |c| c.engine.stockpile(depot).unwrap().total() > 0));
    assert_eq!(
        colony.engine.stockpile(depot).unwrap().count(ResourceKind::Wood),
        4,
        "both loads arrive together"
    );
}

#[test]
fn removed_workplace_leaves_worker_waiting() {
    let mut colony = Colony::new();
    colony.engine.assign(colony.worker, colony.forest).unwrap();
    colony.engine.despawn(colony.forest).unwrap();

    let start = colony.engine.snapshot(colony.worker).unwrap().position;
    colony.run_until(5.0, |_| false);
    let snap = colony.engine.snapshot(colony.worker).unwrap();
    assert_eq!(snap.phase, Phase::MovingToWorkplace);
    assert_eq!(snap.position, start);
    assert_eq!(snap.stuck, Default::default());
}

#[test]
fn reassignment_mid_leg() {
    let mut colony = Colony::new();
    let quarry = colony.engine.spawn_workplace(
        Vec2::new(0.0, -10.0),
        Vec2::new(2.0, 2.0),
        ResourceKind::Stone,
        1,
        1.0,
    );
    colony.engine.assign(colony.worker, colony.forest).unwrap();
    colony.run_until(1.0, |_| false);
    colony.engine.assign(colony.worker, quarry).unwrap();
    assert_eq!(colony.phase(), Phase::MovingToWorkplace);

    assert!(colony.run_until(15.0, |c| c.phase() == Phase::Interacting));
    let snap = colony.engine.snapshot(colony.worker).unwrap();
    assert!(snap.position.y < -7.0, "worker at {:?}", snap.position);
}

// ── Snapshots ──────────────────────────────────────────────────────────

#[test]
fn snapshots_serialize_for_viewers() {
    let mut colony = Colony::new();
    colony.engine.assign(colony.worker, colony.forest).unwrap();
    colony.run_until(0.5, |_| false);

    let json = serde_json::to_value(colony.engine.snapshots()).unwrap();
    let first = &json[0];
    assert_eq!(first["kind"], "woodcutter");
    assert_eq!(first["phase"], "moving_to_workplace");
    assert_eq!(first["stuck"], "clear");
    assert_eq!(first["last_plan"], "direct");
    assert!(first["route"].as_array().is_some_and(|r| !r.is_empty()));
}
