//! Worker job loop as an explicit state machine.
//!
//! ```text
//! Idle ──assigned──▶ MovingToWorkplace ──arrive──▶ Interacting
//!  ▲                                                   │ interaction time
//!  └───────────────────────────────────────────────────┘
//! Idle (carrying) ──▶ MovingToDepot ──arrive──▶ Delivering ──▶ ReturningToWork
//! ReturningToWork ──arrive──▶ Interacting
//! ```
//!
//! Idle is resolved in the same tick it is entered. Moving legs carry a
//! bounded wait; when it expires the leg restarts in the same phase. The leg
//! timer is paused while the worker is stuck.

use serde::{Deserialize, Serialize};

use crate::config::CycleConfig;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::inventory::Inventory;
use crate::obstacles::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    MovingToWorkplace,
    Interacting,
    MovingToDepot,
    Delivering,
    ReturningToWork,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Idle,
            Phase::MovingToWorkplace,
            Phase::Interacting,
            Phase::MovingToDepot,
            Phase::Delivering,
            Phase::ReturningToWork,
        ]
    }

    /// Phases in which the worker travels.
    pub fn is_moving(&self) -> bool {
        matches!(
            self,
            Phase::MovingToWorkplace | Phase::MovingToDepot | Phase::ReturningToWork
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::MovingToWorkplace => "moving_to_workplace",
            Phase::Interacting => "interacting",
            Phase::MovingToDepot => "moving_to_depot",
            Phase::Delivering => "delivering",
            Phase::ReturningToWork => "returning_to_work",
        }
    }
}

/// Per-kind work capability. The cycle decides *when*; the behavior decides
/// *what* is harvested and whether a depot accepts it.
pub trait WorkBehavior {
    /// Seconds spent in `Interacting` per visit.
    fn interaction_time(&self) -> f32;

    /// Called once per completed interaction.
    fn collect_resources(&mut self, workplace: EntityId, inventory: &mut Inventory);

    fn has_resources_to_deliver(&self, inventory: &Inventory) -> bool {
        !inventory.is_empty()
    }

    /// Offer the full inventory to `depot`. Returns true when accepted; the
    /// cycle then zeroes the inventory.
    fn deliver_resources(&mut self, depot: EntityId, inventory: &Inventory) -> bool;
}

/// Per-tick inputs from the navigation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleSignals {
    /// Within interaction radius of the current destination.
    pub arrived: bool,
    /// The stuck detector owns the worker.
    pub stuck: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleOutcome {
    pub phase_changed: bool,
    /// The current moving leg timed out and starts over.
    pub restart_leg: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkCycle {
    phase: Phase,
    workplace: Option<EntityId>,
    depot: Option<EntityId>,
    phase_elapsed: f32,
    leg_elapsed: f32,
}

impl WorkCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn workplace(&self) -> Option<EntityId> {
        self.workplace
    }

    pub fn depot(&self) -> Option<EntityId> {
        self.depot
    }

    /// Seconds spent in the current phase.
    pub fn phase_elapsed(&self) -> f32 {
        self.phase_elapsed
    }

    /// Seconds spent on the current moving leg, excluding stuck time.
    pub fn leg_elapsed(&self) -> f32 {
        self.leg_elapsed
    }

    /// Assign (or reassign) a workplace; restarts at `MovingToWorkplace`.
    pub fn assign_workplace(&mut self, workplace: EntityId) {
        self.workplace = Some(workplace);
        self.enter(Phase::MovingToWorkplace);
    }

    pub fn set_depot(&mut self, depot: Option<EntityId>) {
        self.depot = depot;
    }

    /// Drop the workplace and collapse to `Idle`. The depot is kept.
    pub fn unassign(&mut self) {
        self.workplace = None;
        self.enter(Phase::Idle);
    }

    /// Entity the worker should currently be at or heading to.
    pub fn destination_target(&self) -> Option<EntityId> {
        match self.phase {
            Phase::Idle => None,
            Phase::MovingToWorkplace | Phase::Interacting | Phase::ReturningToWork => {
                self.workplace
            }
            Phase::MovingToDepot | Phase::Delivering => self.depot,
        }
    }

    pub fn restart_leg(&mut self) {
        self.leg_elapsed = 0.0;
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.phase_elapsed = 0.0;
        self.leg_elapsed = 0.0;
    }

    /// Pick the next leg out of `Idle`; stays idle when the needed target is
    /// missing.
    fn resolve_idle<B: WorkBehavior + ?Sized>(&mut self, behavior: &B, inventory: &Inventory) {
        if behavior.has_resources_to_deliver(inventory) {
            if self.depot.is_some() {
                self.enter(Phase::MovingToDepot);
            }
        } else if self.workplace.is_some() {
            self.enter(Phase::MovingToWorkplace);
        }
    }

    /// Advance the machine by one tick.
    #[allow(clippy::too_many_arguments)]
    pub fn advance<B: WorkBehavior + ?Sized>(
        &mut self,
        agent: EntityId,
        signals: CycleSignals,
        behavior: &mut B,
        inventory: &mut Inventory,
        config: &CycleConfig,
        dt: f32,
        sink: &mut dyn DiagnosticSink,
    ) -> CycleOutcome {
        let before = self.phase;
        let mut outcome = CycleOutcome::default();
        self.phase_elapsed += dt;

        match self.phase {
            Phase::Idle => self.resolve_idle(behavior, inventory),
            Phase::MovingToWorkplace | Phase::ReturningToWork | Phase::MovingToDepot => {
                if signals.arrived {
                    let next = if self.phase == Phase::MovingToDepot {
                        Phase::Delivering
                    } else {
                        Phase::Interacting
                    };
                    self.enter(next);
                } else if !signals.stuck {
                    self.leg_elapsed += dt;
                    if self.leg_elapsed >= config.leg_timeout {
                        self.leg_elapsed = 0.0;
                        outcome.restart_leg = true;
                        sink.emit(DiagnosticEvent::LegTimedOut {
                            agent,
                            phase: self.phase,
                        });
                    }
                }
            }
            Phase::Interacting => match self.workplace {
                None => self.enter(Phase::Idle),
                Some(workplace) => {
                    if self.phase_elapsed >= behavior.interaction_time() {
                        let held = inventory.total();
                        behavior.collect_resources(workplace, inventory);
                        sink.emit(DiagnosticEvent::Harvested {
                            agent,
                            workplace,
                            amount: inventory.total().saturating_sub(held),
                        });
                        self.enter(Phase::Idle);
                        self.resolve_idle(behavior, inventory);
                    }
                }
            },
            Phase::Delivering => {
                // Waits here if the depot vanished between arrival and now
                if let Some(depot) = self.depot {
                    if behavior.has_resources_to_deliver(inventory) {
                        if behavior.deliver_resources(depot, inventory) {
                            let amount = inventory.total();
                            inventory.clear();
                            sink.emit(DiagnosticEvent::Delivered {
                                agent,
                                depot,
                                amount,
                            });
                        } else {
                            sink.emit(DiagnosticEvent::DeliveryFailed { agent, depot });
                        }
                    }
                    self.enter(Phase::ReturningToWork);
                }
            }
        }

        if self.phase != before {
            outcome.phase_changed = true;
            sink.emit(DiagnosticEvent::PhaseChanged {
                agent,
                from: before,
                to: self.phase,
            });
        }
        outcome
    }
}
