//! Fire-and-forget status events.
//!
//! Navigation never fails loudly; anything worth knowing about (a worker got
//! stuck, a leg timed out, a delivery was refused) is reported as a
//! [`DiagnosticEvent`] through a [`DiagnosticSink`] supplied by the caller.

use std::fmt;

use serde::Serialize;

use crate::geometry::Vec2;
use crate::obstacles::EntityId;
use crate::work_cycle::Phase;

/// How a stuck episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryKind {
    /// Walked far enough from the stuck origin.
    Moved,
    /// Reached the destination while recovering.
    Arrived,
    /// Critical relocation.
    Relocated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    PhaseChanged {
        agent: EntityId,
        from: Phase,
        to: Phase,
    },
    StuckDetected {
        agent: EntityId,
        origin: Vec2,
        at: f64,
    },
    RecoveryEscalated {
        agent: EntityId,
        attempt: u32,
    },
    CriticalRelocation {
        agent: EntityId,
        to: Vec2,
        /// The preferred spot was occupied; moved the opposite way unchecked.
        blind: bool,
    },
    Recovered {
        agent: EntityId,
        via: RecoveryKind,
    },
    LegTimedOut {
        agent: EntityId,
        phase: Phase,
    },
    DetourFallback {
        agent: EntityId,
        from: Vec2,
        to: Vec2,
    },
    Harvested {
        agent: EntityId,
        workplace: EntityId,
        amount: u32,
    },
    Delivered {
        agent: EntityId,
        depot: EntityId,
        amount: u32,
    },
    DeliveryFailed {
        agent: EntityId,
        depot: EntityId,
    },
}

impl DiagnosticEvent {
    pub fn agent(&self) -> EntityId {
        match *self {
            DiagnosticEvent::PhaseChanged { agent, .. }
            | DiagnosticEvent::StuckDetected { agent, .. }
            | DiagnosticEvent::RecoveryEscalated { agent, .. }
            | DiagnosticEvent::CriticalRelocation { agent, .. }
            | DiagnosticEvent::Recovered { agent, .. }
            | DiagnosticEvent::LegTimedOut { agent, .. }
            | DiagnosticEvent::DetourFallback { agent, .. }
            | DiagnosticEvent::Harvested { agent, .. }
            | DiagnosticEvent::Delivered { agent, .. }
            | DiagnosticEvent::DeliveryFailed { agent, .. } => agent,
        }
    }

    /// Log level the event is reported at by [`LogSink`].
    pub fn level(&self) -> log::Level {
        match self {
            DiagnosticEvent::StuckDetected { .. }
            | DiagnosticEvent::CriticalRelocation { .. }
            | DiagnosticEvent::LegTimedOut { .. }
            | DiagnosticEvent::DeliveryFailed { .. } => log::Level::Warn,
            DiagnosticEvent::PhaseChanged { .. } => log::Level::Debug,
            _ => log::Level::Info,
        }
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::PhaseChanged { agent, from, to } => {
                write!(f, "worker {agent}: {} -> {}", from.label(), to.label())
            }
            DiagnosticEvent::StuckDetected { agent, origin, at } => write!(
                f,
                "worker {agent}: stuck at ({:.2}, {:.2}), t={at:.2}s",
                origin.x, origin.y
            ),
            DiagnosticEvent::RecoveryEscalated { agent, attempt } => {
                write!(f, "worker {agent}: recovery attempt {attempt}")
            }
            DiagnosticEvent::CriticalRelocation { agent, to, blind } => write!(
                f,
                "worker {agent}: relocated to ({:.2}, {:.2}){}",
                to.x,
                to.y,
                if *blind { " without clearance check" } else { "" }
            ),
            DiagnosticEvent::Recovered { agent, via } => {
                write!(f, "worker {agent}: recovered ({via:?})")
            }
            DiagnosticEvent::LegTimedOut { agent, phase } => {
                write!(f, "worker {agent}: {} leg timed out, restarting", phase.label())
            }
            DiagnosticEvent::DetourFallback { agent, from, to } => write!(
                f,
                "worker {agent}: no clear detour ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                from.x, from.y, to.x, to.y
            ),
            DiagnosticEvent::Harvested {
                agent,
                workplace,
                amount,
            } => write!(f, "worker {agent}: harvested {amount} at {workplace}"),
            DiagnosticEvent::Delivered {
                agent,
                depot,
                amount,
            } => write!(f, "worker {agent}: delivered {amount} to {depot}"),
            DiagnosticEvent::DeliveryFailed { agent, depot } => {
                write!(f, "worker {agent}: depot {depot} refused delivery")
            }
        }
    }
}

/// Receiver for diagnostic events.
pub trait DiagnosticSink {
    fn emit(&mut self, event: DiagnosticEvent);
}

impl DiagnosticSink for Vec<DiagnosticEvent> {
    fn emit(&mut self, event: DiagnosticEvent) {
        self.push(event);
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, event: DiagnosticEvent) {
        log::log!(event.level(), "{event}");
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _event: DiagnosticEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stuck_and_timeout_are_warnings() {
        let stuck = DiagnosticEvent::StuckDetected {
            agent: 1,
            origin: Vec2::ZERO,
            at: 2.5,
        };
        let timeout = DiagnosticEvent::LegTimedOut {
            agent: 1,
            phase: Phase::MovingToDepot,
        };
        let harvest = DiagnosticEvent::Harvested {
            agent: 1,
            workplace: 2,
            amount: 3,
        };
        assert_eq!(stuck.level(), log::Level::Warn);
        assert_eq!(timeout.level(), log::Level::Warn);
        assert_eq!(harvest.level(), log::Level::Info);
    }

    #[test]
    fn display_is_readable() {
        let e = DiagnosticEvent::PhaseChanged {
            agent: 4,
            from: Phase::Interacting,
            to: Phase::MovingToDepot,
        };
        assert_eq!(e.to_string(), "worker 4: interacting -> moving_to_depot");
        assert_eq!(e.agent(), 4);
    }

    #[test]
    fn serializes_with_event_tag() {
        let e = DiagnosticEvent::DeliveryFailed { agent: 1, depot: 9 };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["event"], "delivery_failed");
        assert_eq!(json["depot"], 9);
    }

    #[test]
    fn vec_sink_collects() {
        let mut sink: Vec<DiagnosticEvent> = Vec::new();
        sink.emit(DiagnosticEvent::RecoveryEscalated {
            agent: 1,
            attempt: 2,
        });
        NullSink.emit(DiagnosticEvent::RecoveryEscalated {
            agent: 1,
            attempt: 3,
        });
        assert_eq!(sink.len(), 1);
    }
}
