//! Error types for the engine's fallible edges.
//!
//! Ticking never fails; only configuration loading and the entity API do.

use colonynav_logic::config::ConfigIssue;
use thiserror::Error;

/// Failure to load a navigation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// An entity handed to the engine API is missing or of the wrong kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("entity {0:?} is not a worker")]
    UnknownWorker(hecs::Entity),
    #[error("entity {0:?} is not a workplace")]
    UnknownWorkplace(hecs::Entity),
    #[error("entity {0:?} is not a depot")]
    UnknownDepot(hecs::Entity),
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(hecs::Entity),
}

/// Failure to build a colony from a scenario file.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("malformed scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("worker {worker} references missing {what} #{index}")]
    BadReference {
        worker: usize,
        what: &'static str,
        index: usize,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_lists_every_issue() {
        let err = ConfigError::Invalid(vec![
            ConfigIssue::NoRecoveryAttempts,
            ConfigIssue::NoDetourSteps,
        ]);
        assert_eq!(
            err.to_string(),
            "invalid config: max_recovery_attempts must be at least 1; max_detour_steps must be at least 1"
        );
    }
}
