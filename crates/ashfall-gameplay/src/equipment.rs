//! Equipment slots and equipped-item instances.
//!
//! Slots hold an item id plus the instance data rolled at craft time (the
//! quality tier). Two-handed weapons occupy both hand slots atomically:
//! equipping one sets both, unequipping either clears both.

use ashfall_common::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::content::{EquipSlot, ItemDefinition};
use crate::skills::ItemQuality;

/// Equipment error types.
#[derive(Debug, Clone, Error)]
pub enum EquipError {
    /// Item has no equip slot
    #[error("{0} cannot be equipped")]
    NotEquippable(ItemId),
    /// Nothing is equipped in the slot
    #[error("Nothing equipped in {0:?}")]
    SlotEmpty(EquipSlot),
}

/// Result type for equipment operations.
pub type EquipResult<T> = Result<T, EquipError>;

/// An equipped item instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedItem {
    /// Equipped item id.
    pub item: ItemId,
    /// Quality rolled when the item was crafted.
    pub quality: ItemQuality,
    /// Whether the instance spans both hand slots.
    pub two_handed: bool,
}

impl EquippedItem {
    /// Scales a combat modifier by the instance quality (truncating).
    #[must_use]
    pub fn scaled(&self, modifier: u32) -> u32 {
        (f64::from(modifier) * f64::from(self.quality.multiplier())) as u32
    }
}

/// An actor's equipped items, by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    slots: HashMap<EquipSlot, EquippedItem>,
}

impl Equipment {
    /// Creates empty equipment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the item equipped in a slot.
    #[must_use]
    pub fn get(&self, slot: EquipSlot) -> Option<&EquippedItem> {
        self.slots.get(&slot)
    }

    /// Returns the main-hand weapon, if any.
    #[must_use]
    pub fn weapon(&self) -> Option<&EquippedItem> {
        self.get(EquipSlot::MainHand)
    }

    /// Equips an item, returning any displaced instances.
    ///
    /// The definition decides the slot; a two-handed item claims both hand
    /// slots and displaces whatever occupied either.
    pub fn equip(
        &mut self,
        definition: &ItemDefinition,
        quality: ItemQuality,
    ) -> EquipResult<Vec<EquippedItem>> {
        let slot = definition
            .slot
            .ok_or_else(|| EquipError::NotEquippable(definition.id.clone()))?;

        let instance = EquippedItem {
            item: definition.id.clone(),
            quality,
            two_handed: definition.two_handed,
        };

        let mut displaced = Vec::new();
        if definition.two_handed {
            for hand in [EquipSlot::MainHand, EquipSlot::OffHand] {
                if let Some(previous) = self.remove_instance(hand) {
                    displaced.push(previous);
                }
            }
            self.slots.insert(EquipSlot::MainHand, instance.clone());
            self.slots.insert(EquipSlot::OffHand, instance);
        } else {
            if let Some(previous) = self.remove_instance(slot) {
                displaced.push(previous);
            }
            self.slots.insert(slot, instance);
        }
        Ok(displaced)
    }

    /// Unequips a slot, returning the removed instance.
    ///
    /// Unequipping either hand of a two-handed weapon clears both.
    pub fn unequip(&mut self, slot: EquipSlot) -> EquipResult<EquippedItem> {
        self.remove_instance(slot).ok_or(EquipError::SlotEmpty(slot))
    }

    /// Removes the instance in a slot, clearing the paired hand slot for a
    /// two-handed weapon. Returns the instance once.
    fn remove_instance(&mut self, slot: EquipSlot) -> Option<EquippedItem> {
        let instance = self.slots.remove(&slot)?;
        if instance.two_handed {
            self.slots.remove(&EquipSlot::MainHand);
            self.slots.remove(&EquipSlot::OffHand);
        }
        Some(instance)
    }

    /// Iterates each equipped instance once.
    ///
    /// The off-hand mirror of a two-handed weapon is skipped so aggregation
    /// never double-counts it.
    pub fn pieces(&self) -> impl Iterator<Item = (EquipSlot, &EquippedItem)> {
        self.slots.iter().filter_map(|(&slot, instance)| {
            if slot == EquipSlot::OffHand && instance.two_handed {
                None
            } else {
                Some((slot, instance))
            }
        })
    }

    /// Number of occupied slots (a two-handed weapon occupies two).
    #[must_use]
    pub fn occupied_slots(&self) -> usize {
        self.slots.len()
    }
}
