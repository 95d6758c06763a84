//! ColonyNav Core - Colony Worker Simulation Engine
//!
//! An ECS-based colony where workers walk between workplaces and depots,
//! harvesting and delivering resources while steering around buildings,
//! deposits and terrain.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Workers, workplaces, depots, blockers
//! - **Components**: Pure data attached to entities (Footprint, Workplace, Depot, etc.)
//! - **Systems**: Logic that queries and updates components
//!
//! Per-worker navigation (planning, path following, stuck recovery and the
//! work cycle) lives in `colonynav-logic`; this crate owns the world and
//! feeds it to that logic once per update.
//!
//! # Example
//!
//! ```rust,no_run
//! use colonynav_core::prelude::*;
//!
//! let mut engine = ColonyEngine::new();
//! let depot = engine.spawn_depot(Vec2::new(0.0, 0.0), Vec2::new(3.0, 3.0));
//! let forest = engine.spawn_workplace(
//!     Vec2::new(12.0, 4.0),
//!     Vec2::new(2.0, 2.0),
//!     ResourceKind::Wood,
//!     1,
//!     2.0,
//! );
//! let worker = engine.spawn_worker(WorkerKind::Woodcutter, Vec2::new(2.0, 0.0));
//! engine.assign(worker, forest).unwrap();
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//!     if engine.stockpile(depot).unwrap().total() >= 10 {
//!         break;
//!     }
//! }
//! ```

pub mod behavior;
pub mod components;
pub mod engine;
pub mod error;
pub mod scenario;
pub mod settings;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{AgentSnapshot, ColonyEngine};
    pub use crate::error::{ConfigError, EngineError, ScenarioError};
    pub use colonynav_logic::geometry::{Aabb, Shape, Vec2};
    pub use colonynav_logic::inventory::{Inventory, ResourceKind};
    pub use colonynav_logic::obstacles::ObstacleClass;
    pub use colonynav_logic::work_cycle::Phase;
}
