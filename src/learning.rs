// File: src/learning.rs
use crate::core::model::ModelStore;
use crate::core::types::{FeatureId, ItemId, ModelEntry, TrainingDicts, WeightedFeature};
use crate::error::{NbError, Result};
use tracing::{debug, warn};

/// Applies training examples to a `ModelStore`.
///
/// A training example is an item with its features plus the items it
/// depends on. Every dependency gains one unit of positive evidence and one
/// unit of co-occurrence evidence per feature of the example.
#[derive(Debug, Clone)]
pub struct Trainer {
    prior_weight: f64,
    evidence_increment: f64,
}

fn feature_ids(features: &[WeightedFeature]) -> Vec<FeatureId> {
    features.iter().map(|&(feature, _weight)| feature).collect()
}

impl Trainer {
    pub fn new(prior_weight: f64) -> Self {
        Self { prior_weight, evidence_increment: 1.0 }
    }

    /// Builds a model from scratch.
    ///
    /// Each of `training_items` gets a seeded entry, then every key of
    /// `dicts.dependencies` is replayed as a training example that also
    /// reinforces the key itself. The result is independent of iteration
    /// order. On error no partially built model escapes.
    pub fn initialize(&self, training_items: &[ItemId], dicts: &TrainingDicts) -> Result<ModelStore> {
        let mut store = ModelStore::new();
        for &item in training_items {
            let own = dicts
                .features_of(item)
                .ok_or(NbError::MissingTrainingData { item, what: "features" })?;
            store.insert(item, ModelEntry::seeded(self.prior_weight, own));
        }

        for (&key, deps) in &dicts.dependencies {
            let features = dicts
                .features_of(key)
                .map(feature_ids)
                .ok_or(NbError::MissingTrainingData { item: key, what: "features" })?;
            for &dep in std::iter::once(&key).chain(deps) {
                store.reinforce(dep, &features, self.evidence_increment)?;
            }
        }

        debug!(items = store.len(), examples = dicts.dependencies.len(), "model initialized");
        Ok(store)
    }

    /// Learns one new training example.
    ///
    /// `item` gets a seeded entry if it is new. Every other dependency must
    /// already be in the model; this is checked before anything changes.
    pub fn update(
        &self,
        store: &mut ModelStore,
        item: ItemId,
        features: &[WeightedFeature],
        dependencies: &[ItemId],
    ) -> Result<()> {
        if let Some(&missing) = dependencies.iter().find(|&&dep| dep != item && !store.contains(dep)) {
            return Err(NbError::ItemNotFound { item: missing });
        }

        store.get_or_insert_with(item, || ModelEntry::seeded(self.prior_weight, features));
        let features = feature_ids(features);
        for &dep in dependencies {
            store.reinforce(dep, &features, self.evidence_increment)?;
        }
        debug!(item, dependencies = dependencies.len(), "training example added");
        Ok(())
    }

    /// Exact inverse of the mutation step of `update`. Never creates entries
    /// or keys and never clamps, so unmatched deletes drive counts negative.
    pub fn delete(
        &self,
        store: &mut ModelStore,
        item: ItemId,
        features: &[WeightedFeature],
        dependencies: &[ItemId],
    ) -> Result<()> {
        let features = feature_ids(features);
        for &dep in dependencies {
            let entry = store.entry(dep)?;
            if let Some(&feature) = features.iter().find(|&&f| !entry.feature_counts.contains_key(&f)) {
                return Err(NbError::FeatureNotFound { item: dep, feature });
            }
        }

        for &dep in dependencies {
            store.weaken(dep, &features, self.evidence_increment)?;
        }
        debug!(item, dependencies = dependencies.len(), "training example removed");
        Ok(())
    }

    /// Replaces the recorded dependencies of `item` with `new_dependencies`.
    ///
    /// This is a delete followed by an update. If the update fails the model
    /// stays in the post-delete state; the caller decides how to recover.
    pub fn overwrite(
        &self,
        store: &mut ModelStore,
        item: ItemId,
        new_dependencies: &[ItemId],
        dicts: &TrainingDicts,
    ) -> Result<()> {
        if !store.contains(item) {
            return Err(NbError::ItemNotFound { item });
        }
        let features = dicts
            .features_of(item)
            .ok_or(NbError::MissingTrainingData { item, what: "features" })?;
        let old_dependencies = dicts
            .dependencies_of(item)
            .ok_or(NbError::MissingTrainingData { item, what: "dependencies" })?;

        self.delete(store, item, features, old_dependencies)?;
        if let Err(err) = self.update(store, item, features, new_dependencies) {
            warn!(item, error = %err, "overwrite failed after removing old dependencies");
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIOR: f64 = 20.0;

    fn unit(features: &[FeatureId]) -> Vec<WeightedFeature> {
        features.iter().map(|&f| (f, 1.0)).collect()
    }

    fn reference_dicts() -> TrainingDicts {
        let mut dicts = TrainingDicts::default();
        dicts.features.insert(0, unit(&[0, 1, 2]));
        dicts.features.insert(1, unit(&[3, 2, 1]));
        dicts.dependencies.insert(0, vec![0]);
        dicts.dependencies.insert(1, vec![0, 1]);
        dicts
    }

    fn reference_model() -> ModelStore {
        Trainer::new(PRIOR).initialize(&[0, 1], &reference_dicts()).unwrap()
    }

    #[test]
    fn initialize_replays_every_example_reflexively() {
        let store = reference_model();
        let zero = store.get(0).unwrap();
        // Seeded prior, twice from example 0 ([0] + [0]) and once from example 1.
        assert_eq!(zero.positive_count, PRIOR + 3.0);
        assert_eq!(zero.feature_counts[&2], PRIOR + 3.0);
        assert_eq!(zero.feature_counts[&3], 1.0);

        let one = store.get(1).unwrap();
        assert_eq!(one.positive_count, PRIOR + 2.0);
        assert!(!one.feature_counts.contains_key(&0));
    }

    #[test]
    fn initialize_with_zero_prior_does_not_seed_features() {
        let mut dicts = TrainingDicts::default();
        dicts.features.insert(5, unit(&[1]));
        dicts.features.insert(6, unit(&[2]));
        dicts.dependencies.insert(6, vec![]);
        let store = Trainer::new(0.0).initialize(&[5, 6], &dicts).unwrap();
        assert!(store.get(5).unwrap().feature_counts.is_empty());
        assert_eq!(store.get(6).unwrap().positive_count, 1.0);
        assert_eq!(store.get(6).unwrap().feature_counts[&2], 1.0);
    }

    #[test]
    fn initialize_rejects_dependency_outside_training_items() {
        let mut dicts = reference_dicts();
        dicts.dependencies.insert(1, vec![0, 1, 42]);
        let err = Trainer::new(PRIOR).initialize(&[0, 1], &dicts).unwrap_err();
        assert!(matches!(err, NbError::ItemNotFound { item: 42 }));
    }

    #[test]
    fn initialize_rejects_training_item_without_features() {
        let err = Trainer::new(PRIOR).initialize(&[0, 1, 9], &reference_dicts()).unwrap_err();
        assert!(matches!(err, NbError::MissingTrainingData { item: 9, .. }));
    }

    #[test]
    fn update_creates_new_item_and_reinforces_dependencies() {
        let trainer = Trainer::new(PRIOR);
        let mut store = reference_model();
        let before = store.get(0).unwrap().positive_count;

        trainer.update(&mut store, 2, &unit(&[14, 1, 3]), &[0, 2]).unwrap();

        let zero = store.get(0).unwrap();
        assert_eq!(zero.positive_count, before + 1.0);
        assert_eq!(zero.feature_counts[&14], 1.0);
        let two = store.get(2).unwrap();
        assert_eq!(two.positive_count, PRIOR + 1.0);
        assert_eq!(two.feature_counts[&14], PRIOR + 1.0);
    }

    #[test]
    fn update_with_unknown_dependency_changes_nothing() {
        let trainer = Trainer::new(PRIOR);
        let mut store = reference_model();
        let before = store.clone();

        let err = trainer.update(&mut store, 2, &unit(&[1]), &[0, 7]).unwrap_err();
        assert!(matches!(err, NbError::ItemNotFound { item: 7 }));
        assert_eq!(store, before);
    }

    #[test]
    fn delete_undoes_update() {
        let trainer = Trainer::new(PRIOR);
        let mut store = reference_model();
        trainer.update(&mut store, 2, &unit(&[14, 1]), &[0, 2]).unwrap();
        let after_update = store.clone();

        trainer.update(&mut store, 2, &unit(&[3, 8]), &[0, 1]).unwrap();
        trainer.delete(&mut store, 2, &unit(&[3, 8]), &[0, 1]).unwrap();

        for dep in [0, 1] {
            let old = after_update.get(dep).unwrap();
            let new = store.get(dep).unwrap();
            assert_eq!(new.positive_count, old.positive_count);
            for feature in [3, 8] {
                let old_count = old.feature_counts.get(&feature).copied().unwrap_or(0.0);
                assert_eq!(new.feature_counts[&feature], old_count);
            }
        }
        // Keys created by the update stay behind at zero.
        assert_eq!(store.get(0).unwrap().feature_counts.get(&8), Some(&0.0));
        assert_eq!(store.get(2), after_update.get(2));
    }

    #[test]
    fn delete_of_untrained_pair_goes_negative() {
        let trainer = Trainer::new(0.0);
        let mut dicts = TrainingDicts::default();
        dicts.features.insert(0, unit(&[1]));
        dicts.dependencies.insert(0, vec![]);
        let mut store = trainer.initialize(&[0], &dicts).unwrap();

        trainer.delete(&mut store, 0, &unit(&[1]), &[0, 0]).unwrap();
        let zero = store.get(0).unwrap();
        assert_eq!(zero.positive_count, -1.0);
        assert_eq!(zero.feature_counts[&1], -1.0);
    }

    #[test]
    fn delete_missing_feature_key_is_not_found() {
        let trainer = Trainer::new(PRIOR);
        let mut store = reference_model();
        let before = store.clone();
        let err = trainer.delete(&mut store, 1, &unit(&[0]), &[0, 1]).unwrap_err();
        assert!(matches!(err, NbError::FeatureNotFound { item: 1, feature: 0 }));
        assert_eq!(store, before);
    }

    #[test]
    fn overwrite_moves_evidence_between_dependencies() {
        let trainer = Trainer::new(PRIOR);
        let dicts = reference_dicts();
        let mut store = reference_model();
        let zero_before = store.get(0).unwrap().positive_count;
        let one_before = store.get(1).unwrap().positive_count;

        trainer.overwrite(&mut store, 1, &[1], &dicts).unwrap();

        assert_eq!(store.get(0).unwrap().positive_count, zero_before - 1.0);
        assert_eq!(store.get(1).unwrap().positive_count, one_before);
        assert_eq!(store.get(0).unwrap().feature_counts[&3], 0.0);
    }

    #[test]
    fn overwrite_requires_trained_item() {
        let trainer = Trainer::new(PRIOR);
        let mut store = reference_model();
        let err = trainer.overwrite(&mut store, 5, &[0], &reference_dicts()).unwrap_err();
        assert!(matches!(err, NbError::ItemNotFound { item: 5 }));
    }

    #[test]
    fn failed_overwrite_keeps_post_delete_state() {
        let trainer = Trainer::new(PRIOR);
        let dicts = reference_dicts();
        let mut store = reference_model();
        let one_before = store.get(1).unwrap().positive_count;

        let err = trainer.overwrite(&mut store, 1, &[99], &dicts).unwrap_err();
        assert!(matches!(err, NbError::ItemNotFound { item: 99 }));
        // Old dependencies [0, 1] were already removed.
        assert_eq!(store.get(1).unwrap().positive_count, one_before - 1.0);
    }
}
