//! Per-worker carried resources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resource kinds a workplace can yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Wood,
    Stone,
    Food,
    Gold,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Wood,
            ResourceKind::Stone,
            ResourceKind::Food,
            ResourceKind::Gold,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
            ResourceKind::Food => "food",
            ResourceKind::Gold => "gold",
        }
    }
}

/// Integer counts per resource kind. Counts are unsigned, so they can never
/// go negative; removal saturates at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    counts: BTreeMap<ResourceKind, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        if amount == 0 {
            return;
        }
        let slot = self.counts.entry(kind).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Remove up to `amount`, returning how much was actually taken.
    pub fn remove(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let Some(slot) = self.counts.get_mut(&kind) else {
            return 0;
        };
        let taken = amount.min(*slot);
        *slot -= taken;
        if *slot == 0 {
            self.counts.remove(&kind);
        }
        taken
    }

    pub fn count(&self, kind: ResourceKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Zero every counter.
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Non-zero entries in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u32)> + '_ {
        self.counts
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(k, n)| (*k, *n))
    }

    /// Add every entry of `other` into this inventory.
    pub fn merge(&mut self, other: &Inventory) {
        for (kind, amount) in other.iter() {
            self.add(kind, amount);
        }
    }
}
