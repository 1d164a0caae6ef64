//! Counted inventory.

use ashfall_common::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::content::ContentRegistry;

/// Inventory error types.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    /// Not enough items
    #[error("Not enough of {item}: need {needed}, have {have}")]
    NotEnough {
        /// Item in question
        item: ItemId,
        /// Amount needed
        needed: u32,
        /// Amount available
        have: u32,
    },
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// An item-count container.
///
/// Counts never go negative; an entry is removed entirely when its count
/// reaches zero. Weight is derived on demand from the content registry so
/// unknown ids contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: HashMap<ItemId, u32>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count of a specific item.
    #[must_use]
    pub fn count(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Checks whether at least `amount` of an item is held.
    #[must_use]
    pub fn has(&self, item: &str, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Adds items.
    pub fn add(&mut self, item: impl Into<ItemId>, amount: u32) {
        if amount == 0 {
            return;
        }
        *self.items.entry(item.into()).or_insert(0) += amount;
    }

    /// Removes items; fails without mutating when the count is short.
    pub fn remove(&mut self, item: impl Into<ItemId>, amount: u32) -> InventoryResult<()> {
        let item = item.into();
        let current = self.count(item.as_str());
        if current < amount {
            return Err(InventoryError::NotEnough {
                item,
                needed: amount,
                have: current,
            });
        }
        if current == amount {
            self.items.remove(&item);
        } else {
            self.items.insert(item, current - amount);
        }
        Ok(())
    }

    /// Number of distinct item entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.items.len()
    }

    /// Total carry weight of the contents.
    #[must_use]
    pub fn total_weight(&self, registry: &ContentRegistry) -> u32 {
        self.items
            .iter()
            .map(|(id, count)| registry.item_weight(id.as_str()) * count)
            .sum()
    }

    /// Iterates all items and counts.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, u32)> {
        self.items.iter().map(|(id, &count)| (id, count))
    }

    /// Finds the first held item matching a predicate on its definition.
    pub fn find_by<'a>(
        &'a self,
        registry: &'a ContentRegistry,
        mut predicate: impl FnMut(&crate::content::ItemDefinition) -> bool,
    ) -> Option<&'a ItemId> {
        // HashMap order is arbitrary; pick the lexicographically first match
        // so results are stable across runs.
        self.items
            .keys()
            .filter(|id| registry.item(id.as_str()).is_some_and(&mut predicate))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{AmmoKind, ContentRegistry, ItemDefinition};

    #[test]
    fn test_add_and_count() {
        let mut inv = Inventory::new();
        inv.add("wood", 5);
        inv.add("wood", 2);

        assert_eq!(inv.count("wood"), 7);
        assert_eq!(inv.count("stone"), 0);
        assert!(inv.has("wood", 7));
        assert!(!inv.has("wood", 8));
    }

    #[test]
    fn test_remove_soft_fails_without_mutation() {
        let mut inv = Inventory::new();
        inv.add("wood", 3);

        let result = inv.remove("wood", 5);
        assert!(matches!(
            result,
            Err(InventoryError::NotEnough {
                needed: 5,
                have: 3,
                ..
            })
        ));
        // Nothing changed on failure.
        assert_eq!(inv.count("wood"), 3);
    }

    #[test]
    fn test_remove_to_zero_drops_entry() {
        let mut inv = Inventory::new();
        inv.add("wood", 3);
        inv.remove("wood", 3).expect("have enough");

        assert_eq!(inv.count("wood"), 0);
        assert_eq!(inv.entry_count(), 0);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut inv = Inventory::new();
        inv.add("wood", 0);
        assert_eq!(inv.entry_count(), 0);
    }

    #[test]
    fn test_total_weight_unknown_item_is_zero() {
        let mut registry = ContentRegistry::new();
        registry.register_item(ItemDefinition::new("wood", "Wood", 2));

        let mut inv = Inventory::new();
        inv.add("wood", 3);
        inv.add("mystery", 10);

        assert_eq!(inv.total_weight(&registry), 6);
    }

    #[test]
    fn test_find_by_is_stable() {
        let mut registry = ContentRegistry::new();
        registry
            .register_item(ItemDefinition::new("arrow", "Arrow", 1).with_ammo(AmmoKind::Arrow));
        registry.register_item(
            ItemDefinition::new("bone_arrow", "Bone Arrow", 1).with_ammo(AmmoKind::Arrow),
        );

        let mut inv = Inventory::new();
        inv.add("bone_arrow", 5);
        inv.add("arrow", 5);

        let found = inv.find_by(&registry, |def| def.ammo == Some(AmmoKind::Arrow));
        assert_eq!(found.map(ItemId::as_str), Some("arrow"));
    }
}
