//! Colony engine - main entry point for running the simulation

use std::collections::HashMap;

use colonynav_logic::agent::WorkerAgent;
use colonynav_logic::config::NavConfig;
use colonynav_logic::diagnostics::{DiagnosticEvent, DiagnosticSink, LogSink};
use colonynav_logic::geometry::{Aabb, Shape, Vec2};
use colonynav_logic::inventory::{Inventory, ResourceKind};
use colonynav_logic::obstacles::{ObstacleClass, ObstacleField};
use colonynav_logic::planner::PlanKind;
use colonynav_logic::stuck::StuckState;
use colonynav_logic::work_cycle::Phase;
use hecs::{Entity, World};
use serde::Serialize;

use crate::components::*;
use crate::error::{ConfigError, EngineError};
use crate::settings::check_config;
use crate::systems::*;

/// Per-worker state exported for viewers and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub id: u64,
    pub kind: WorkerKind,
    pub position: Vec2,
    pub facing_left: bool,
    pub phase: Phase,
    pub stuck: StuckState,
    pub carrying: u32,
    pub workplace: Option<u64>,
    pub depot: Option<u64>,
    /// Waypoints not yet reached.
    pub route: Vec<Vec2>,
    pub last_plan: Option<PlanKind>,
}

/// Event sink that logs every event and keeps it for the caller.
struct QueueSink<'a> {
    queue: &'a mut Vec<DiagnosticEvent>,
}

impl DiagnosticSink for QueueSink<'_> {
    fn emit(&mut self, event: DiagnosticEvent) {
        LogSink.emit(event.clone());
        self.queue.push(event);
    }
}

/// Main simulation engine
pub struct ColonyEngine {
    /// ECS world containing all entities
    pub world: World,
    /// Simulation time in seconds since start
    sim_time: f64,
    config: NavConfig,
    /// Rebuilt lazily after footprints change
    field: ObstacleField,
    field_dirty: bool,
    /// Colony seed, mixed into every worker's own random stream
    seed: u64,
    events: Vec<DiagnosticEvent>,
    last_stats: NavigationStats,
    time_scale: f32,
}

impl ColonyEngine {
    /// Create an empty colony with default tuning
    pub fn new() -> Self {
        Self::with_config(NavConfig::default(), 0)
    }

    /// Create an empty colony; `seed` drives every random recovery direction.
    pub fn with_config(config: NavConfig, seed: u64) -> Self {
        Self {
            world: World::new(),
            sim_time: 0.0,
            field: ObstacleField::new(config.agent.radius),
            config,
            field_dirty: false,
            seed,
            events: Vec::new(),
            last_stats: NavigationStats::default(),
            time_scale: 1.0,
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Replace the tuning. Existing workers keep their radius.
    pub fn set_config(&mut self, config: NavConfig) -> Result<(), ConfigError> {
        check_config(&config)?;
        self.config = config;
        self.field_dirty = true;
        Ok(())
    }

    /// Current obstacle field, rebuilt first if any footprint changed.
    pub fn obstacle_field(&mut self) -> &ObstacleField {
        self.refresh_field();
        &self.field
    }

    fn refresh_field(&mut self) {
        if self.field_dirty {
            self.field = build_obstacle_field(&self.world, self.config.agent.radius);
            self.field_dirty = false;
        }
    }

    // ── Spawning ───────────────────────────────────────────────────────

    /// Spawn a rectangular workplace centered at `position`.
    pub fn spawn_workplace(
        &mut self,
        position: Vec2,
        size: Vec2,
        resource: ResourceKind,
        base_yield: u32,
        interaction_time: f32,
    ) -> Entity {
        self.field_dirty = true;
        self.world.spawn((
            Workplace {
                resource,
                base_yield,
                interaction_time,
            },
            Footprint::structure(Shape::Rect(Aabb::new(position.x, position.y, size.x, size.y))),
        ))
    }

    /// Spawn an open depot centered at `position`.
    pub fn spawn_depot(&mut self, position: Vec2, size: Vec2) -> Entity {
        self.field_dirty = true;
        self.world.spawn((
            Depot::open(),
            Footprint::structure(Shape::Rect(Aabb::new(position.x, position.y, size.x, size.y))),
        ))
    }

    /// Spawn a blocker (deposit, rock, wall).
    pub fn spawn_obstacle(&mut self, shape: Shape, class: ObstacleClass) -> Entity {
        self.field_dirty = true;
        self.world.spawn((Blocker, Footprint { shape, class }))
    }

    /// Spawn an unassigned worker.
    pub fn spawn_worker(&mut self, kind: WorkerKind, position: Vec2) -> Entity {
        let rng = WorkerRng::seeded(self.seed, kind, position);
        let entity = self.world.spawn((Worker { kind }, rng));
        let agent = WorkerAgent::new(entity_id(entity), position, self.config.agent.radius);
        // Freshly spawned, so the insert cannot miss
        let _ = self.world.insert_one(entity, agent);
        entity
    }

    /// Remove any entity. Workers pointing at a removed site wait in place
    /// until reassigned.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), EngineError> {
        if self.world.get::<&Footprint>(entity).is_ok() {
            self.field_dirty = true;
        }
        self.world
            .despawn(entity)
            .map_err(|_| EngineError::NoSuchEntity(entity))
    }

    // ── Assignment ─────────────────────────────────────────────────────

    fn with_agent<T>(
        &mut self,
        worker: Entity,
        f: impl FnOnce(&mut WorkerAgent) -> T,
    ) -> Result<T, EngineError> {
        let mut agent = self
            .world
            .get::<&mut WorkerAgent>(worker)
            .map_err(|_| EngineError::UnknownWorker(worker))?;
        Ok(f(&mut *agent))
    }

    /// Assign (or reassign) a worker to a workplace. A worker without a
    /// depot is given the nearest one.
    pub fn assign(&mut self, worker: Entity, workplace: Entity) -> Result<(), EngineError> {
        if self.world.get::<&Workplace>(workplace).is_err() {
            return Err(EngineError::UnknownWorkplace(workplace));
        }
        let nearest = self.nearest_depot(self.footprint_center(workplace));
        self.with_agent(worker, |agent| {
            agent.assign(entity_id(workplace));
            if agent.cycle.depot().is_none() {
                agent.set_depot(nearest.map(entity_id));
            }
        })
    }

    /// Point a worker at a specific depot.
    pub fn set_depot(&mut self, worker: Entity, depot: Entity) -> Result<(), EngineError> {
        if self.world.get::<&Depot>(depot).is_err() {
            return Err(EngineError::UnknownDepot(depot));
        }
        self.with_agent(worker, |agent| agent.set_depot(Some(entity_id(depot))))
    }

    /// Send a worker back to `Idle`, dropping its route and stuck state.
    pub fn unassign(&mut self, worker: Entity) -> Result<(), EngineError> {
        self.with_agent(worker, |agent| agent.unassign())
    }

    /// Relocate a depot; workers heading there replan on their next tick.
    pub fn move_depot(&mut self, depot: Entity, position: Vec2) -> Result<(), EngineError> {
        if self.world.get::<&Depot>(depot).is_err() {
            return Err(EngineError::UnknownDepot(depot));
        }
        let moved = self
            .world
            .get::<&Footprint>(depot)
            .map(|fp| fp.moved_to(position))
            .map_err(|_| EngineError::UnknownDepot(depot))?;
        self.world
            .insert_one(depot, moved)
            .map_err(|_| EngineError::UnknownDepot(depot))?;
        self.field_dirty = true;
        Ok(())
    }

    /// Open or close a depot for deliveries.
    pub fn set_depot_accepting(&mut self, depot: Entity, accepting: bool) -> Result<(), EngineError> {
        let mut d = self
            .world
            .get::<&mut Depot>(depot)
            .map_err(|_| EngineError::UnknownDepot(depot))?;
        d.accepting = accepting;
        Ok(())
    }

    fn footprint_center(&self, entity: Entity) -> Option<Vec2> {
        self.world
            .get::<&Footprint>(entity)
            .ok()
            .map(|fp| fp.bounds().center())
    }

    /// Depot whose footprint center is closest to `from`.
    pub fn nearest_depot(&self, from: Option<Vec2>) -> Option<Entity> {
        let from = from?;
        self.world
            .query::<(&Depot, &Footprint)>()
            .iter()
            .map(|(entity, (_, fp))| (entity, fp.bounds().center().distance_squared(from)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(entity, _)| entity)
    }

    // ── Simulation ─────────────────────────────────────────────────────

    /// Update the simulation by delta_seconds
    pub fn update(&mut self, delta_seconds: f32) {
        let scaled_delta = delta_seconds * self.time_scale;
        if scaled_delta <= 0.0 {
            return;
        }
        self.sim_time += scaled_delta as f64;
        self.refresh_field();

        let mut sink = QueueSink {
            queue: &mut self.events,
        };
        self.last_stats = navigation_system(
            &mut self.world,
            &self.field,
            &self.config,
            self.sim_time,
            scaled_delta,
            &mut sink,
        );
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Get current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Get current simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Counters from the most recent update
    pub fn last_stats(&self) -> NavigationStats {
        self.last_stats
    }

    /// Take every diagnostic emitted since the last call
    pub fn drain_events(&mut self) -> Vec<DiagnosticEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Count workers
    pub fn worker_count(&self) -> usize {
        self.world.query::<&Worker>().iter().count()
    }

    /// Count blockers (not counting workplaces and depots)
    pub fn obstacle_count(&self) -> usize {
        self.world.query::<&Blocker>().iter().count()
    }

    /// Number of workers in each phase
    pub fn phase_counts(&self) -> HashMap<Phase, usize> {
        let mut counts: HashMap<Phase, usize> = Phase::all().iter().map(|p| (*p, 0)).collect();
        for (_, agent) in self.world.query::<&WorkerAgent>().iter() {
            *counts.entry(agent.phase()).or_insert(0) += 1;
        }
        counts
    }

    /// Contents of one depot
    pub fn stockpile(&self, depot: Entity) -> Result<Inventory, EngineError> {
        self.world
            .get::<&Depot>(depot)
            .map(|d| d.stockpile.clone())
            .map_err(|_| EngineError::UnknownDepot(depot))
    }

    /// Sum of every depot's stockpile
    pub fn total_stockpile(&self) -> Inventory {
        let mut total = Inventory::new();
        for (_, depot) in self.world.query::<&Depot>().iter() {
            total.merge(&depot.stockpile);
        }
        total
    }

    pub fn snapshot(&self, worker: Entity) -> Result<AgentSnapshot, EngineError> {
        let worker_tag = self
            .world
            .get::<&Worker>(worker)
            .map_err(|_| EngineError::UnknownWorker(worker))?;
        let agent = self
            .world
            .get::<&WorkerAgent>(worker)
            .map_err(|_| EngineError::UnknownWorker(worker))?;
        Ok(snapshot_of(&worker_tag, &agent))
    }

    /// Snapshots of every worker, ordered by id
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        let mut out: Vec<AgentSnapshot> = self
            .world
            .query::<(&Worker, &WorkerAgent)>()
            .iter()
            .map(|(_, (worker, agent))| snapshot_of(worker, agent))
            .collect();
        out.sort_by_key(|s| s.id);
        out
    }
}

fn snapshot_of(worker: &Worker, agent: &WorkerAgent) -> AgentSnapshot {
    AgentSnapshot {
        id: agent.id,
        kind: worker.kind,
        position: agent.body.position,
        facing_left: agent.body.facing_left,
        phase: agent.phase(),
        stuck: agent.stuck().state(),
        carrying: agent.inventory.total(),
        workplace: agent.cycle.workplace(),
        depot: agent.cycle.depot(),
        route: agent.navigator().path().remaining().to_vec(),
        last_plan: agent.navigator().last_plan(),
    }
}

impl Default for ColonyEngine {
    fn default() -> Self {
        Self::new()
    }
}
