//! Scenario files - a colony layout described in JSON
//!
//! Sites are referenced from workers by their index in the file, so a
//! scenario is self-contained and needs no entity ids.

use colonynav_logic::config::NavConfig;
use colonynav_logic::geometry::{Shape, Vec2};
use colonynav_logic::inventory::ResourceKind;
use colonynav_logic::obstacles::ObstacleClass;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::components::WorkerKind;
use crate::engine::ColonyEngine;
use crate::error::ScenarioError;
use crate::settings::check_config;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSpec {
    pub position: Vec2,
    #[serde(default = "default_site_size")]
    pub size: Vec2,
}

fn default_site_size() -> Vec2 {
    Vec2::new(2.0, 2.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkplaceSpec {
    #[serde(flatten)]
    pub site: SiteSpec,
    pub resource: ResourceKind,
    #[serde(default = "default_yield")]
    pub base_yield: u32,
    #[serde(default = "default_interaction_time")]
    pub interaction_time: f32,
}

fn default_yield() -> u32 {
    1
}

fn default_interaction_time() -> f32 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    pub shape: Shape,
    #[serde(default = "default_obstacle_class")]
    pub class: ObstacleClass,
}

fn default_obstacle_class() -> ObstacleClass {
    ObstacleClass::Generic
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub kind: WorkerKind,
    pub position: Vec2,
    /// Index into `workplaces`
    #[serde(default)]
    pub workplace: Option<usize>,
    /// Index into `depots`; the nearest depot is used when omitted
    #[serde(default)]
    pub depot: Option<usize>,
}

/// A whole colony layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSpec {
    pub name: String,
    pub seed: u64,
    pub config: NavConfig,
    pub depots: Vec<SiteSpec>,
    pub workplaces: Vec<WorkplaceSpec>,
    pub obstacles: Vec<ObstacleSpec>,
    pub workers: Vec<WorkerSpec>,
}

/// Entities created from a scenario, in file order.
#[derive(Debug, Clone, Default)]
pub struct ScenarioEntities {
    pub depots: Vec<Entity>,
    pub workplaces: Vec<Entity>,
    pub obstacles: Vec<Entity>,
    pub workers: Vec<Entity>,
}

impl ScenarioSpec {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check every worker reference before anything is spawned.
    fn check_references(&self) -> Result<(), ScenarioError> {
        for (worker, spec) in self.workers.iter().enumerate() {
            if let Some(index) = spec.workplace.filter(|i| *i >= self.workplaces.len()) {
                return Err(ScenarioError::BadReference {
                    worker,
                    what: "workplace",
                    index,
                });
            }
            if let Some(index) = spec.depot.filter(|i| *i >= self.depots.len()) {
                return Err(ScenarioError::BadReference {
                    worker,
                    what: "depot",
                    index,
                });
            }
        }
        Ok(())
    }

    /// Build an engine holding this colony.
    pub fn build(&self) -> Result<(ColonyEngine, ScenarioEntities), ScenarioError> {
        check_config(&self.config)?;
        self.check_references()?;

        let mut engine = ColonyEngine::with_config(self.config.clone(), self.seed);
        let mut entities = ScenarioEntities::default();

        for depot in &self.depots {
            entities
                .depots
                .push(engine.spawn_depot(depot.position, depot.size));
        }
        for wp in &self.workplaces {
            entities.workplaces.push(engine.spawn_workplace(
                wp.site.position,
                wp.site.size,
                wp.resource,
                wp.base_yield,
                wp.interaction_time,
            ));
        }
        for obstacle in &self.obstacles {
            entities
                .obstacles
                .push(engine.spawn_obstacle(obstacle.shape, obstacle.class));
        }
        for spec in &self.workers {
            let worker = engine.spawn_worker(spec.kind, spec.position);
            if let Some(index) = spec.depot {
                engine.set_depot(worker, entities.depots[index])?;
            }
            if let Some(index) = spec.workplace {
                engine.assign(worker, entities.workplaces[index])?;
            }
            entities.workers.push(worker);
        }

        log::info!(
            "scenario '{}': {} workers, {} workplaces, {} depots, {} obstacles",
            self.name,
            entities.workers.len(),
            entities.workplaces.len(),
            entities.depots.len(),
            entities.obstacles.len()
        );
        Ok((engine, entities))
    }
}

/// Parse and build a scenario in one step.
pub fn load_scenario(json: &str) -> Result<(ColonyEngine, ScenarioEntities), ScenarioError> {
    ScenarioSpec::from_json(json)?.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonynav_logic::work_cycle::Phase;

    const SMALL: &str = r#"{
        "name": "clearing",
        "seed": 3,
        "depots": [{ "position": { "x": 0.0, "y": 0.0 } }],
        "workplaces": [
            { "position": { "x": 10.0, "y": 0.0 }, "resource": "wood", "base_yield": 2 }
        ],
        "obstacles": [
            { "shape": { "circle": { "center": { "x": 5.0, "y": 3.0 }, "radius": 1.0 } } }
        ],
        "workers": [
            { "kind": "woodcutter", "position": { "x": 2.0, "y": 0.0 }, "workplace": 0 },
            { "kind": "miner", "position": { "x": 2.0, "y": 2.0 } }
        ]
    }"#;

    #[test]
    fn test_load_small_scenario() {
        let (engine, entities) = load_scenario(SMALL).unwrap();
        assert_eq!(engine.worker_count(), 2);
        assert_eq!(engine.obstacle_count(), 1);
        let counts = engine.phase_counts();
        assert_eq!(counts[&Phase::MovingToWorkplace], 1);
        assert_eq!(counts[&Phase::Idle], 1);

        let snap = engine.snapshot(entities.workers[0]).unwrap();
        assert_eq!(snap.depot, Some(crate::components::entity_id(entities.depots[0])));
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let json = r#"{ "workers": [ { "kind": "farmer", "position": { "x": 0, "y": 0 }, "workplace": 2 } ] }"#;
        match load_scenario(json) {
            Err(ScenarioError::BadReference { worker, what, index }) => {
                assert_eq!((worker, what, index), (0, "workplace", 2));
            }
            other => panic!("expected BadReference, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_bad_config_is_rejected() {
        let json = r#"{ "config": { "agent": { "radius": 0.0 } } }"#;
        assert!(matches!(load_scenario(json), Err(ScenarioError::Config(_))));
        assert!(matches!(load_scenario("{"), Err(ScenarioError::Parse(_))));
    }
}
