//! Navigation system - ticks every worker through its work cycle

use colonynav_logic::agent::{TickEnv, TickReport, WorkerAgent};
use colonynav_logic::config::NavConfig;
use colonynav_logic::diagnostics::DiagnosticSink;
use colonynav_logic::obstacles::ObstacleField;
use colonynav_logic::stuck::StuckState;
use hecs::World;

use super::surroundings::collect_targets;
use crate::behavior::{ColonyLedger, ColonyWork};
use crate::components::{Worker, WorkerRng};

/// Counters for one navigation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationStats {
    pub ticked: usize,
    pub moving: usize,
    pub stuck: usize,
    pub replans: usize,
}

impl NavigationStats {
    fn record(&mut self, report: &TickReport) {
        self.ticked += 1;
        if report.phase_after.is_moving() {
            self.moving += 1;
        }
        if matches!(report.stuck_state, StuckState::Stuck | StuckState::Recovering) {
            self.stuck += 1;
        }
        if report.planned.is_some() {
            self.replans += 1;
        }
    }
}

/// Advance every worker by `dt` seconds.
///
/// Obstacles and targets are read-only for the whole pass; deliveries are
/// collected in a ledger and credited to depots afterwards. Each worker draws
/// from its own [`WorkerRng`], so query order never leaks into movement.
pub fn navigation_system(
    world: &mut World,
    field: &ObstacleField,
    config: &NavConfig,
    now: f64,
    dt: f32,
    sink: &mut dyn DiagnosticSink,
) -> NavigationStats {
    let targets = collect_targets(world);
    let mut ledger = ColonyLedger::from_world(world);
    let env = TickEnv {
        obstacles: field,
        targets: &targets,
        config,
        now,
        dt,
    };

    let mut stats = NavigationStats::default();
    for (_, (worker, agent, rng)) in
        world.query_mut::<(&Worker, &mut WorkerAgent, &mut WorkerRng)>()
    {
        let mut work = ColonyWork {
            kind: worker.kind,
            workplace: agent.cycle.workplace(),
            ledger: &mut ledger,
        };
        let report = agent.tick(&env, &mut work, &mut rng.0, sink);
        stats.record(&report);
    }

    ledger.apply(world);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{entity_id, Depot, Footprint, Workplace, WorkerKind};
    use crate::systems::build_obstacle_field;
    use colonynav_logic::diagnostics::NullSink;
    use colonynav_logic::geometry::{Aabb, Shape, Vec2};
    use colonynav_logic::inventory::ResourceKind;
    use colonynav_logic::work_cycle::Phase;

    #[test]
    fn workers_deliver_into_depot_stockpile() {
        let mut world = World::new();
        let field_site = world.spawn((
            Workplace {
                resource: ResourceKind::Food,
                base_yield: 1,
                interaction_time: 0.5,
            },
            Footprint::structure(Shape::Rect(Aabb::new(6.0, 0.0, 1.0, 1.0))),
        ));
        let depot = world.spawn((
            Depot::open(),
            Footprint::structure(Shape::Rect(Aabb::new(-3.0, 0.0, 1.0, 1.0))),
        ));
        let worker = world.spawn((
            Worker {
                kind: WorkerKind::Farmer,
            },
            WorkerRng::seeded(7, WorkerKind::Farmer, Vec2::ZERO),
        ));
        let mut agent = WorkerAgent::new(entity_id(worker), Vec2::ZERO, 0.3);
        agent.assign(entity_id(field_site));
        agent.set_depot(Some(entity_id(depot)));
        world.insert_one(worker, agent).unwrap();

        let config = NavConfig::default();
        let field = build_obstacle_field(&world, config.agent.radius);
        let mut now = 0.0;
        let mut delivered = false;
        for _ in 0..400 {
            now += 0.05;
            let stats = navigation_system(&mut world, &field, &config, now, 0.05, &mut NullSink);
            assert_eq!(stats.ticked, 1);
            let stock = world.get::<&Depot>(depot).unwrap().stockpile.total();
            if stock > 0 {
                assert_eq!(stock, 2, "farmer doubles food");
                delivered = true;
                break;
            }
        }
        assert!(delivered);
        let phase = world.get::<&WorkerAgent>(worker).unwrap().phase();
        assert_eq!(phase, Phase::ReturningToWork);
    }
}
