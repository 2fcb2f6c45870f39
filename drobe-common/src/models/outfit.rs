//! Outfit slots and the assembled outfit mapping

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Fixed outfit slot set. Closed enumeration — no dynamic slot types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutfitSlot {
    Top,
    Bottom,
    Shoes,
    Jacket,
    Hat,
    Accessories,
}

impl OutfitSlot {
    /// All slots, in display order
    pub const ALL: [OutfitSlot; 6] = [
        OutfitSlot::Top,
        OutfitSlot::Bottom,
        OutfitSlot::Shoes,
        OutfitSlot::Jacket,
        OutfitSlot::Hat,
        OutfitSlot::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutfitSlot::Top => "top",
            OutfitSlot::Bottom => "bottom",
            OutfitSlot::Shoes => "shoes",
            OutfitSlot::Jacket => "jacket",
            OutfitSlot::Hat => "hat",
            OutfitSlot::Accessories => "accessories",
        }
    }

    /// Parse a slot from a loosely-cased name (planner responses key
    /// outfits by slot name).
    pub fn from_name(name: &str) -> Option<OutfitSlot> {
        match name.trim().to_lowercase().as_str() {
            "top" => Some(OutfitSlot::Top),
            "bottom" => Some(OutfitSlot::Bottom),
            "shoes" => Some(OutfitSlot::Shoes),
            "jacket" => Some(OutfitSlot::Jacket),
            "hat" => Some(OutfitSlot::Hat),
            "accessories" => Some(OutfitSlot::Accessories),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutfitSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An assembled outfit: every slot maps to a wardrobe item id or is empty.
///
/// Invariant: the same item id never occupies two slots. `assign` enforces
/// this; callers treat a refused assignment as "candidate unavailable".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outfit {
    slots: BTreeMap<OutfitSlot, Uuid>,
}

impl Outfit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `item_id` to `slot`. Refused (returns false) when the slot is
    /// already filled or the item already occupies another slot.
    pub fn assign(&mut self, slot: OutfitSlot, item_id: Uuid) -> bool {
        if self.slots.contains_key(&slot) || self.contains_item(item_id) {
            return false;
        }
        self.slots.insert(slot, item_id);
        true
    }

    /// Item currently assigned to `slot`, if any
    pub fn get(&self, slot: OutfitSlot) -> Option<Uuid> {
        self.slots.get(&slot).copied()
    }

    /// Whether `item_id` occupies any slot
    pub fn contains_item(&self, item_id: Uuid) -> bool {
        self.slots.values().any(|id| *id == item_id)
    }

    /// Number of filled slots
    pub fn filled_count(&self) -> usize {
        self.slots.len()
    }

    /// Slots with no assignment, in display order
    pub fn empty_slots(&self) -> Vec<OutfitSlot> {
        OutfitSlot::ALL
            .iter()
            .copied()
            .filter(|slot| !self.slots.contains_key(slot))
            .collect()
    }

    /// Iterate filled `(slot, item_id)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (OutfitSlot, Uuid)> + '_ {
        self.slots.iter().map(|(slot, id)| (*slot, *id))
    }
}
