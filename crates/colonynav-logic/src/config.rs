//! Navigation tuning.
//!
//! Every knob the planner, follower, stuck detector and work cycle read lives
//! here, grouped per component. All groups deserialize with `#[serde(default)]`
//! so a config file only needs the values it changes.
//!
//! ```
//! use colonynav_logic::config::{validate_config, NavConfig};
//!
//! let mut config = NavConfig::default();
//! config.agent.speed = 3.0;
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Worker body and arrival tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Walking speed in units per second.
    pub speed: f32,
    /// Collision radius of a worker.
    pub radius: f32,
    /// Distance to an approach point that counts as arrival.
    pub interaction_radius: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            radius: 0.3,
            interaction_radius: 0.5,
        }
    }
}

/// Approach point selection around workplace/depot footprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproachConfig {
    /// How far outside the footprint outline an approach point sits.
    pub standoff: f32,
    /// Probe length used to measure local clearance around a candidate.
    pub clearance_probe: f32,
    /// Score bonus per unit of local clearance (score = distance - weight * clearance).
    pub clearance_weight: f32,
}

impl Default for ApproachConfig {
    fn default() -> Self {
        Self {
            standoff: 0.5,
            clearance_probe: 1.5,
            clearance_weight: 0.5,
        }
    }
}

/// Local path planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// When false the follower steers straight at the target with reactive
    /// avoidance only.
    pub enabled: bool,
    /// Lateral offset of a detour waypoint.
    pub avoidance_radius: f32,
    /// Probe length used to pick the detour side.
    pub clearance_probe: f32,
    /// Largest multiple of `avoidance_radius` tried for a detour.
    pub max_detour_steps: u32,
    /// Free radius required around a detour waypoint.
    pub waypoint_clearance: f32,
    /// Drop redundant interior waypoints.
    pub smoothing: bool,
    /// Seconds between routine replans.
    pub replan_interval: f32,
    /// Destination movement that forces an immediate replan.
    pub replan_distance: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            avoidance_radius: 2.0,
            clearance_probe: 3.0,
            max_detour_steps: 3,
            waypoint_clearance: 0.3,
            smoothing: true,
            replan_interval: 1.0,
            replan_distance: 0.5,
        }
    }
}

/// Path follower and reactive avoidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Distance at which a waypoint counts as reached.
    pub snap_radius: f32,
    /// Length of the look-ahead probe.
    pub probe_distance: f32,
    /// Share of the obstacle tangent in the avoidance vector (rest keeps the heading).
    pub avoid_blend: f32,
    /// Seconds the avoidance vector is held before steering directly again.
    pub avoid_duration: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            snap_radius: 0.2,
            probe_distance: 1.0,
            avoid_blend: 0.7,
            avoid_duration: 0.5,
        }
    }
}

/// Stuck detection and recovery ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StuckConfig {
    /// Seconds between position samples.
    pub check_interval: f32,
    /// Summed window displacement below which a sample counts as "not moving".
    pub movement_threshold: f32,
    /// Accumulated stuck time that flags the agent as stuck.
    pub stuck_time_threshold: f32,
    /// Escalations before critical relocation.
    pub max_recovery_attempts: u32,
    /// Recovery walking speed as a fraction of normal speed.
    pub recovery_speed_factor: f32,
    /// Look-ahead used to rotate a blocked recovery direction.
    pub recovery_probe: f32,
    /// Jump length of a critical relocation.
    pub critical_offset: f32,
    /// Distance from the stuck origin that counts as recovered.
    pub reset_distance: f32,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            check_interval: 0.5,
            movement_threshold: 0.1,
            stuck_time_threshold: 2.0,
            max_recovery_attempts: 3,
            recovery_speed_factor: 0.7,
            recovery_probe: 1.0,
            critical_offset: 1.5,
            reset_distance: 2.0,
        }
    }
}

impl StuckConfig {
    /// Time spent on one recovery attempt before escalating.
    pub fn attempt_window(&self) -> f32 {
        self.stuck_time_threshold * 3.0
    }
}

/// Work cycle timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Bounded wait for a single moving leg.
    pub leg_timeout: f32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self { leg_timeout: 30.0 }
    }
}

/// Complete navigation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub agent: AgentConfig,
    pub approach: ApproachConfig,
    pub planner: PlannerConfig,
    pub follower: FollowerConfig,
    pub stuck: StuckConfig,
    pub cycle: CycleConfig,
}

/// A single problem found by [`validate_config`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be within (0, 1], got {value}")]
    FractionOutOfRange { field: &'static str, value: f32 },
    #[error("max_recovery_attempts must be at least 1")]
    NoRecoveryAttempts,
    #[error("max_detour_steps must be at least 1")]
    NoDetourSteps,
    #[error("check_interval {interval} exceeds stuck_time_threshold {threshold}")]
    CheckIntervalTooLong { interval: f32, threshold: f32 },
}

/// Validate a configuration, returning all issues found.
pub fn validate_config(config: &NavConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    let positives = [
        ("agent.speed", config.agent.speed),
        ("agent.radius", config.agent.radius),
        ("agent.interaction_radius", config.agent.interaction_radius),
        ("approach.clearance_probe", config.approach.clearance_probe),
        ("planner.avoidance_radius", config.planner.avoidance_radius),
        ("planner.clearance_probe", config.planner.clearance_probe),
        ("planner.replan_interval", config.planner.replan_interval),
        ("planner.replan_distance", config.planner.replan_distance),
        ("follower.snap_radius", config.follower.snap_radius),
        ("follower.probe_distance", config.follower.probe_distance),
        ("follower.avoid_duration", config.follower.avoid_duration),
        ("stuck.check_interval", config.stuck.check_interval),
        ("stuck.movement_threshold", config.stuck.movement_threshold),
        ("stuck.stuck_time_threshold", config.stuck.stuck_time_threshold),
        ("stuck.recovery_probe", config.stuck.recovery_probe),
        ("stuck.critical_offset", config.stuck.critical_offset),
        ("stuck.reset_distance", config.stuck.reset_distance),
        ("cycle.leg_timeout", config.cycle.leg_timeout),
    ];
    for (field, value) in positives {
        // NaN fails this check too
        if !(value > 0.0) {
            issues.push(ConfigIssue::NonPositive { field, value });
        }
    }

    let fractions = [
        ("follower.avoid_blend", config.follower.avoid_blend),
        (
            "stuck.recovery_speed_factor",
            config.stuck.recovery_speed_factor,
        ),
    ];
    for (field, value) in fractions {
        if !(value > 0.0 && value <= 1.0) {
            issues.push(ConfigIssue::FractionOutOfRange { field, value });
        }
    }

    if config.stuck.max_recovery_attempts == 0 {
        issues.push(ConfigIssue::NoRecoveryAttempts);
    }
    if config.planner.max_detour_steps == 0 {
        issues.push(ConfigIssue::NoDetourSteps);
    }
    if config.stuck.check_interval > config.stuck.stuck_time_threshold {
        issues.push(ConfigIssue::CheckIntervalTooLong {
            interval: config.stuck.check_interval,
            threshold: config.stuck.stuck_time_threshold,
        });
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&NavConfig::default()).is_empty());
    }

    #[test]
    fn default_values_match_tuning() {
        let c = NavConfig::default();
        assert_eq!(c.stuck.check_interval, 0.5);
        assert_eq!(c.stuck.stuck_time_threshold, 2.0);
        assert_eq!(c.stuck.max_recovery_attempts, 3);
        assert_eq!(c.stuck.attempt_window(), 6.0);
        assert_eq!(c.cycle.leg_timeout, 30.0);
        assert_eq!(c.follower.avoid_blend, 0.7);
    }

    #[test]
    fn reports_every_issue() {
        let mut c = NavConfig::default();
        c.agent.speed = 0.0;
        c.follower.avoid_blend = 1.5;
        c.stuck.max_recovery_attempts = 0;
        c.stuck.check_interval = 5.0;
        let issues = validate_config(&c);
        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&ConfigIssue::NonPositive {
            field: "agent.speed",
            value: 0.0
        }));
        assert!(issues.contains(&ConfigIssue::NoRecoveryAttempts));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::CheckIntervalTooLong { .. })));
    }

    #[test]
    fn nan_is_rejected() {
        let mut c = NavConfig::default();
        c.agent.radius = f32::NAN;
        assert_eq!(validate_config(&c).len(), 1);
    }

    #[test]
    fn issue_messages_are_readable() {
        let issue = ConfigIssue::NonPositive {
            field: "agent.speed",
            value: -1.0,
        };
        assert_eq!(issue.to_string(), "agent.speed must be positive, got -1");
    }
}
