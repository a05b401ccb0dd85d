use crate::config::Hyperparameters;
use crate::core::model::ModelStore;
use crate::core::predictor::Predictor;
use crate::core::types::{ItemId, ModelEntry, TrainingDicts, WeightedFeature};
use crate::error::{NbError, Result};
use crate::learning::Trainer;
use crate::persistence::{load_from_disk, save_to_disk, Snapshot};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// The engine is the single owner of the model. Every mutation goes through
// `&mut self`, so readers can never observe a half-applied overwrite.
pub struct RankerEngine {
    model: ModelStore,
    params: Hyperparameters,
    trainer: Trainer,
    model_path: Option<PathBuf>,
}

impl RankerEngine {
    pub fn new(params: Hyperparameters) -> Self {
        Self {
            model: ModelStore::new(),
            params,
            trainer: Trainer::new(params.default_prior_weight),
            model_path: None,
        }
    }

    /// Loads the snapshot at `path`, or starts empty with `params` when no
    /// file exists yet. Either way later saves go to `path`. A loaded
    /// snapshot keeps its own hyperparameters. Any other failure, such as a
    /// snapshot that does not decode, is returned so the file on disk is
    /// never replaced by an empty model.
    pub fn from_file_or_new(path: &Path, params: Hyperparameters) -> Result<Self> {
        let mut engine = match load_from_disk(path) {
            Ok(snapshot) => {
                info!(path = %path.display(), items = snapshot.model.len(), "model loaded");
                Self::from_snapshot(snapshot)
            }
            Err(NbError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no model yet, starting empty");
                Self::new(params)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "model file is unusable");
                return Err(err);
            }
        };
        engine.model_path = Some(path.to_path_buf());
        Ok(engine)
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let params = snapshot.hyperparameters();
        let mut engine = Self::new(params);
        engine.model = snapshot.model;
        engine
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.model.clone(), self.params)
    }

    /// Replaces the model and hyperparameters with those of `snapshot`.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.params = snapshot.hyperparameters();
        self.trainer = Trainer::new(self.params.default_prior_weight);
        self.model = snapshot.model;
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        self.params
    }

    pub fn entry(&self, item: ItemId) -> Option<&ModelEntry> {
        self.model.get(item)
    }

    pub fn len(&self) -> usize {
        self.model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    /// Rebuilds the model from scratch. The current model is only replaced
    /// if the whole build succeeds.
    pub fn initialize(&mut self, training_items: &[ItemId], dicts: &TrainingDicts) -> Result<()> {
        self.model = self.trainer.initialize(training_items, dicts)?;
        info!(items = self.model.len(), "model rebuilt from training data");
        Ok(())
    }

    pub fn update(&mut self, item: ItemId, features: &[WeightedFeature], dependencies: &[ItemId]) -> Result<()> {
        self.trainer.update(&mut self.model, item, features, dependencies)
    }

    pub fn delete(&mut self, item: ItemId, features: &[WeightedFeature], dependencies: &[ItemId]) -> Result<()> {
        self.trainer.delete(&mut self.model, item, features, dependencies)
    }

    pub fn overwrite(&mut self, item: ItemId, new_dependencies: &[ItemId], dicts: &TrainingDicts) -> Result<()> {
        self.trainer.overwrite(&mut self.model, item, new_dependencies, dicts)
    }

    /// Ranks every candidate by relevance to `query`, best first.
    pub fn predict(&self, query: &[WeightedFeature], candidates: &[ItemId]) -> Result<Vec<(ItemId, f64)>> {
        Predictor::new(&self.model, self.params).rank(query, candidates)
    }

    pub fn save_model(&self) -> Result<()> {
        if let Some(path) = &self.model_path {
            save_to_disk(&self.snapshot(), path)
        } else {
            Ok(()) // Nothing to do without a path
        }
    }
}
