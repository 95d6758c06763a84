//! Worker trades plugged into the work cycle.
//!
//! Workers never touch the world directly during a tick. Harvests read a
//! snapshot of workplace data and deliveries are credited to a
//! [`ColonyLedger`], which is written back to the depots once every worker has
//! been ticked. That keeps the result independent of iteration order.

use std::collections::HashMap;

use colonynav_logic::inventory::Inventory;
use colonynav_logic::obstacles::EntityId;
use colonynav_logic::work_cycle::WorkBehavior;
use hecs::World;

use crate::components::{entity_from_id, entity_id, Depot, Workplace, WorkerKind};

/// Deliveries received by one depot during a tick.
#[derive(Debug, Clone, Default)]
pub struct DepotIntake {
    pub accepting: bool,
    pub received: Inventory,
}

/// Read-only workplace data plus per-tick depot intake.
#[derive(Debug, Clone, Default)]
pub struct ColonyLedger {
    workplaces: HashMap<EntityId, Workplace>,
    depots: HashMap<EntityId, DepotIntake>,
}

impl ColonyLedger {
    pub fn from_world(world: &World) -> Self {
        let workplaces = world
            .query::<&Workplace>()
            .iter()
            .map(|(entity, wp)| (entity_id(entity), *wp))
            .collect();
        let depots = world
            .query::<&Depot>()
            .iter()
            .map(|(entity, depot)| {
                (
                    entity_id(entity),
                    DepotIntake {
                        accepting: depot.accepting,
                        received: Inventory::new(),
                    },
                )
            })
            .collect();
        Self { workplaces, depots }
    }

    pub fn workplace(&self, id: EntityId) -> Option<&Workplace> {
        self.workplaces.get(&id)
    }

    pub fn intake(&self, id: EntityId) -> Option<&DepotIntake> {
        self.depots.get(&id)
    }

    /// Credit everything received this tick to the depot stockpiles.
    pub fn apply(self, world: &mut World) {
        for (id, intake) in self.depots {
            if intake.received.is_empty() {
                continue;
            }
            let Some(entity) = entity_from_id(id) else {
                continue;
            };
            if let Ok(mut depot) = world.get::<&mut Depot>(entity) {
                depot.stockpile.merge(&intake.received);
            }
        }
    }
}

/// [`WorkBehavior`] of one worker for one tick.
pub struct ColonyWork<'a> {
    pub kind: WorkerKind,
    pub workplace: Option<EntityId>,
    pub ledger: &'a mut ColonyLedger,
}

impl WorkBehavior for ColonyWork<'_> {
    fn interaction_time(&self) -> f32 {
        self.workplace
            .and_then(|id| self.ledger.workplace(id))
            .map(|wp| wp.interaction_time * self.kind.pace(wp.resource))
            .unwrap_or(1.0)
    }

    fn collect_resources(&mut self, workplace: EntityId, inventory: &mut Inventory) {
        if let Some(wp) = self.ledger.workplace(workplace) {
            inventory.add(wp.resource, self.kind.yield_for(wp.resource, wp.base_yield));
        }
    }

    fn deliver_resources(&mut self, depot: EntityId, inventory: &Inventory) -> bool {
        match self.ledger.depots.get_mut(&depot) {
            Some(intake) if intake.accepting => {
                intake.received.merge(inventory);
                true
            }
            _ => false,
        }
    }
}
