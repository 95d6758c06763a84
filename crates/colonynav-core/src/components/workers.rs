//! Worker components.
//!
//! A worker entity carries a [`Worker`] tag plus the navigation bundle
//! [`colonynav_logic::agent::WorkerAgent`] (body, cycle, inventory, route and
//! stuck state) and its own [`WorkerRng`].

use colonynav_logic::geometry::Vec2;
use colonynav_logic::inventory::ResourceKind;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Worker trades. Each has a specialty it harvests faster and in larger
/// loads; any worker can still work any site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Woodcutter,
    Miner,
    Farmer,
}

impl WorkerKind {
    pub fn all() -> &'static [WorkerKind] {
        &[WorkerKind::Woodcutter, WorkerKind::Miner, WorkerKind::Farmer]
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkerKind::Woodcutter => "woodcutter",
            WorkerKind::Miner => "miner",
            WorkerKind::Farmer => "farmer",
        }
    }

    pub fn is_specialty(&self, resource: ResourceKind) -> bool {
        matches!(
            (self, resource),
            (WorkerKind::Woodcutter, ResourceKind::Wood)
                | (WorkerKind::Miner, ResourceKind::Stone)
                | (WorkerKind::Miner, ResourceKind::Gold)
                | (WorkerKind::Farmer, ResourceKind::Food)
        )
    }

    /// Units carried away from one interaction.
    pub fn yield_for(&self, resource: ResourceKind, base_yield: u32) -> u32 {
        if self.is_specialty(resource) {
            base_yield.saturating_mul(2)
        } else {
            base_yield
        }
    }

    /// Multiplier on a workplace's interaction time.
    pub fn pace(&self, resource: ResourceKind) -> f32 {
        if self.is_specialty(resource) {
            0.75
        } else {
            1.0
        }
    }
}

/// Marks an entity as a worker of a given trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub kind: WorkerKind,
}

/// Random stream private to one worker (recovery directions).
///
/// Seeded from the colony seed, the trade and the spawn position, so a
/// worker's choices do not depend on how many workers tick before it.
#[derive(Debug, Clone)]
pub struct WorkerRng(pub StdRng);

impl WorkerRng {
    pub fn seeded(colony_seed: u64, kind: WorkerKind, spawn: Vec2) -> Self {
        let place = (u64::from(spawn.x.to_bits()) << 32) | u64::from(spawn.y.to_bits());
        let trade = (kind as u64).wrapping_add(0x9e37_79b9_7f4a_7c15);
        Self(StdRng::seed_from_u64(mix(colony_seed ^ mix(place) ^ mix(trade))))
    }
}

// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn worker_streams_depend_on_identity_not_order() {
        let draw = |rng: &mut WorkerRng| -> Vec<u32> { (0..4).map(|_| rng.0.gen()).collect() };
        let here = Vec2::new(1.0, -2.0);
        let a = draw(&mut WorkerRng::seeded(9, WorkerKind::Miner, here));
        let b = draw(&mut WorkerRng::seeded(9, WorkerKind::Miner, here));
        assert_eq!(a, b);
        assert_ne!(a, draw(&mut WorkerRng::seeded(9, WorkerKind::Farmer, here)));
        assert_ne!(a, draw(&mut WorkerRng::seeded(9, WorkerKind::Miner, Vec2::new(1.0, 2.0))));
        assert_ne!(a, draw(&mut WorkerRng::seeded(10, WorkerKind::Miner, here)));
    }

    #[test]
    fn specialists_double_yield() {
        assert_eq!(WorkerKind::Woodcutter.yield_for(ResourceKind::Wood, 3), 6);
        assert_eq!(WorkerKind::Woodcutter.yield_for(ResourceKind::Stone, 3), 3);
        assert_eq!(WorkerKind::Miner.yield_for(ResourceKind::Gold, 1), 2);
        assert_eq!(WorkerKind::Farmer.pace(ResourceKind::Food), 0.75);
        assert_eq!(WorkerKind::Farmer.pace(ResourceKind::Wood), 1.0);
    }
}
