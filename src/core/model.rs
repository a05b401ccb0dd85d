// --- File: src/core/model.rs
use crate::core::types::{FeatureId, ItemId, ModelEntry};
use crate::error::{NbError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- ModelStore: per-item evidence, mutated in place by the trainer ---

/// Sparse count tables for every trained item.
/// The store is owned by exactly one engine at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStore {
    entries: HashMap<ItemId, ModelEntry>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn get(&self, item: ItemId) -> Option<&ModelEntry> {
        self.entries.get(&item)
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.entries.contains_key(&item)
    }

    /// Looks up an entry that must already exist.
    pub fn entry(&self, item: ItemId) -> Result<&ModelEntry> {
        self.entries.get(&item).ok_or(NbError::ItemNotFound { item })
    }

    pub fn entry_mut(&mut self, item: ItemId) -> Result<&mut ModelEntry> {
        self.entries.get_mut(&item).ok_or(NbError::ItemNotFound { item })
    }

    /// Gets the entry for `item`, creating it with `make` on first sight.
    pub fn get_or_insert_with<F>(&mut self, item: ItemId, make: F) -> &mut ModelEntry
    where
        F: FnOnce() -> ModelEntry,
    {
        self.entries.entry(item).or_insert_with(make)
    }

    /// Inserts or replaces an entry wholesale.
    pub fn insert(&mut self, item: ItemId, entry: ModelEntry) {
        self.entries.insert(item, entry);
    }

    /// Adds `amount` of evidence to `item` for each feature in `features`.
    /// Missing feature keys are created at zero before adding.
    /// O(|features|).
    pub fn reinforce(&mut self, item: ItemId, features: &[FeatureId], amount: f64) -> Result<()> {
        let entry = self.entry_mut(item)?;
        entry.positive_count += amount;
        for &feature in features {
            *entry.feature_counts.entry(feature).or_insert(0.0) += amount;
        }
        Ok(())
    }

    /// Takes back evidence granted by `reinforce`. Unlike `reinforce` this
    /// never creates keys, and counts are allowed to go below zero.
    pub fn weaken(&mut self, item: ItemId, features: &[FeatureId], amount: f64) -> Result<()> {
        let entry = self.entry_mut(item)?;
        if let Some(&feature) = features.iter().find(|&&f| !entry.feature_counts.contains_key(&f)) {
            return Err(NbError::FeatureNotFound { item, feature });
        }
        entry.positive_count -= amount;
        for feature in features {
            if let Some(count) = entry.feature_counts.get_mut(feature) {
                *count -= amount;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
