//! Pure worker navigation logic for colony simulations.
//!
//! This crate moves a single worker between its workplace and a depot: local
//! planning around static obstacles, path following with reactive avoidance,
//! stuck detection with escalating recovery, and the work-cycle state machine
//! that drives it all. Nothing here knows about an ECS or a renderer;
//! collaborators (obstacle queries, target lookup, diagnostics, RNG) are
//! passed in explicitly.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`agent`] | `WorkerAgent` bundle and the per-tick update order |
//! | [`approach`] | Approach point selection around target footprints |
//! | [`config`] | Tuning groups, defaults and validation |
//! | [`diagnostics`] | Status events and sinks |
//! | [`follower`] | Waypoint following, reactive avoidance, replan cadence |
//! | [`geometry`] | `Vec2`, `Aabb`, circle/rect shapes |
//! | [`inventory`] | Carried resource counts |
//! | [`motion`] | Worker body and clamp-then-slide stepping |
//! | [`obstacles`] | Obstacle query surface and in-memory field |
//! | [`path`] | Waypoint route with a forward-only cursor |
//! | [`planner`] | Direct / detour / fallback route construction, smoothing |
//! | [`stuck`] | Stuck detection and recovery ladder |
//! | [`work_cycle`] | Job phases and the `WorkBehavior` capability |

pub mod agent;
pub mod approach;
pub mod config;
pub mod diagnostics;
pub mod follower;
pub mod geometry;
pub mod inventory;
pub mod motion;
pub mod obstacles;
pub mod path;
pub mod planner;
pub mod stuck;
pub mod work_cycle;
