// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a trainable / predictable item (e.g. a known fact).
pub type ItemId = usize;

/// Identifier of an observable feature.
pub type FeatureId = usize;

/// A feature occurrence together with its query weight.
pub type WeightedFeature = (FeatureId, f64);

/// Everything the model knows about a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Total evidence that this item is useful. Seeded with the default prior
    /// weight and bumped once per training example listing it as a dependency.
    pub positive_count: f64,
    /// Sparse co-occurrence counts between this item and observed features.
    pub feature_counts: HashMap<FeatureId, f64>,
}

impl ModelEntry {
    /// A fresh entry for an item seen for the first time. An item always
    /// counts as relevant to itself, so its own features are credited with
    /// the prior weight up front.
    pub fn seeded(prior_weight: f64, own_features: &[WeightedFeature]) -> Self {
        let mut feature_counts = HashMap::new();
        if prior_weight != 0.0 {
            for &(feature, _weight) in own_features {
                feature_counts.insert(feature, prior_weight);
            }
        }
        Self { positive_count: prior_weight, feature_counts }
    }
}

/// Output of the external corpus loader: each item's declared features and,
/// per training example, the items it depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingDicts {
    pub features: HashMap<ItemId, Vec<WeightedFeature>>,
    pub dependencies: HashMap<ItemId, Vec<ItemId>>,
}

impl TrainingDicts {
    pub fn features_of(&self, item: ItemId) -> Option<&[WeightedFeature]> {
        self.features.get(&item).map(Vec::as_slice)
    }

    pub fn dependencies_of(&self, item: ItemId) -> Option<&[ItemId]> {
        self.dependencies.get(&item).map(Vec::as_slice)
    }
}
