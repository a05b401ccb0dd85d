// File: src/config.rs
use crate::error::{NbError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PRIOR_WEIGHT: f64 = 20.0;
pub const DEFAULT_POS_WEIGHT: f64 = 20.0;
pub const DEFAULT_DEF_VAL: f64 = -15.0;
pub const DEFAULT_CUTOFF: usize = 500;

/// The three scalars that shape the model. They are fixed when the model is
/// created and travel with it in every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Credit an item receives for its own features ("p proves p").
    pub default_prior_weight: f64,
    /// Scale applied to a feature count before taking its logarithm.
    pub pos_weight: f64,
    /// Log-score charged for a feature the item has never been seen with.
    pub def_val: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            default_prior_weight: DEFAULT_PRIOR_WEIGHT,
            pos_weight: DEFAULT_POS_WEIGHT,
            def_val: DEFAULT_DEF_VAL,
        }
    }
}

/// Settings for the command-line driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub hyperparameters: Hyperparameters,
    /// Where the model snapshot lives between runs.
    pub model_path: PathBuf,
    /// Number of top-ranked predictions the statistics look at.
    pub cutoff: usize,
    /// Where accumulated statistics are kept between runs. Not persisted
    /// when unset.
    pub stats_path: Option<PathBuf>,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            hyperparameters: Hyperparameters::default(),
            model_path: default_model_path(),
            cutoff: DEFAULT_CUTOFF,
            stats_path: None,
        }
    }
}

impl RankerConfig {
    /// Reads a JSON config file. Missing fields fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| NbError::Config {
            reason: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let hp = &self.hyperparameters;
        if !(hp.default_prior_weight.is_finite() && hp.pos_weight.is_finite() && hp.def_val.is_finite()) {
            return Err(NbError::Config { reason: "hyperparameters must be finite".into() });
        }
        if self.cutoff == 0 {
            return Err(NbError::Config { reason: "cutoff must be positive".into() });
        }
        Ok(())
    }
}

/// Per-user data directory, or the working directory when none is known.
pub fn default_model_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sparse-nb");
    path.push("model.bin");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"hyperparameters": {{"pos_weight": 10.0}}, "cutoff": 100}}"#).unwrap();

        let config = RankerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cutoff, 100);
        assert_eq!(config.hyperparameters.pos_weight, 10.0);
        assert_eq!(config.hyperparameters.default_prior_weight, DEFAULT_PRIOR_WEIGHT);
        assert_eq!(config.hyperparameters.def_val, DEFAULT_DEF_VAL);
    }

    #[test]
    fn malformed_config_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(RankerConfig::from_file(file.path()), Err(NbError::Config { .. })));
    }

    #[test]
    fn zero_cutoff_is_invalid() {
        let config = RankerConfig { cutoff: 0, ..RankerConfig::default() };
        assert!(config.validate().is_err());
    }
}
