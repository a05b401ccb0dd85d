// File: src/session.rs
use crate::config::RankerConfig;
use crate::core::engine::RankerEngine;
use crate::core::types::TrainingDicts;
use crate::error::{NbError, Result};
use crate::protocol::{format_ranking, Command};
use crate::stats::Statistics;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// State of one `nb_engine` run: the engine, the training dictionaries it
/// has been fed (`OVERWRITE` looks up an item's previous dependencies there)
/// and the running statistics.
pub struct Session {
    engine: RankerEngine,
    dicts: TrainingDicts,
    stats: Statistics,
    stats_path: Option<PathBuf>,
    statement: usize,
}

fn load_dicts(path: &Path) -> Result<TrainingDicts> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| NbError::Config { reason: format!("{}: {}", path.display(), e) })
}

fn open_statistics(path: Option<&Path>, cutoff: usize) -> Result<Statistics> {
    let Some(path) = path else {
        return Ok(Statistics::new(cutoff));
    };
    match Statistics::load_from_disk(path) {
        Ok(stats) if stats.cutoff() == cutoff => Ok(stats),
        Ok(stats) => Err(NbError::Config {
            reason: format!("{} was collected with cutoff {}, config says {}", path.display(), stats.cutoff(), cutoff),
        }),
        Err(NbError::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(Statistics::new(cutoff)),
        Err(err) => Err(err),
    }
}

impl Session {
    /// Loads the model and statistics named by `config`. Missing files start
    /// fresh; unreadable ones are an error.
    pub fn open(config: &RankerConfig) -> Result<Self> {
        Ok(Self {
            engine: RankerEngine::from_file_or_new(&config.model_path, config.hyperparameters)?,
            dicts: TrainingDicts::default(),
            stats: open_statistics(config.stats_path.as_deref(), config.cutoff)?,
            stats_path: config.stats_path.clone(),
            statement: 0,
        })
    }

    pub fn engine(&self) -> &RankerEngine {
        &self.engine
    }

    fn save(&self) -> Result<()> {
        self.engine.save_model()?;
        if let Some(path) = &self.stats_path {
            self.stats.save_to_disk(path)?;
        }
        Ok(())
    }

    /// Runs one command. Returns `false` once the session should end.
    pub fn handle(&mut self, command: Command, out: &mut impl Write) -> Result<bool> {
        match command {
            Command::Init { dicts } => {
                let dicts = load_dicts(&dicts)?;
                let mut training_items: Vec<_> = dicts.features.keys().copied().collect();
                training_items.sort_unstable();
                self.engine.initialize(&training_items, &dicts)?;
                self.dicts = dicts;
                writeln!(out, "OK {}", self.engine.len())?;
            }
            Command::Update { item, features, dependencies } => {
                self.engine.update(item, &features, &dependencies)?;
                self.dicts.features.insert(item, features);
                self.dicts.dependencies.insert(item, dependencies);
                writeln!(out, "OK")?;
            }
            Command::Delete { item, features, dependencies } => {
                self.engine.delete(item, &features, &dependencies)?;
                // The example is gone, so there is nothing left to overwrite.
                self.dicts.dependencies.remove(&item);
                writeln!(out, "OK")?;
            }
            Command::Overwrite { item, dependencies } => {
                self.engine.overwrite(item, &dependencies, &self.dicts)?;
                self.dicts.dependencies.insert(item, dependencies);
                writeln!(out, "OK")?;
            }
            Command::Predict { features, candidates } => {
                let ranking = self.engine.predict(&features, &candidates)?;
                writeln!(out, "{}", format_ranking(&ranking))?;
            }
            Command::Eval { features, candidates, dependencies } => {
                let ranking = self.engine.predict(&features, &candidates)?;
                let ranked: Vec<_> = ranking.iter().map(|&(item, _)| item).collect();
                match self.stats.update(&ranked, &dependencies, self.statement) {
                    Some(eval) => writeln!(out, "EVAL auc={:.4} recall100={}", eval.auc, eval.recall100)?,
                    None => writeln!(out, "EVAL skipped")?,
                }
                self.statement += 1;
            }
            Command::Stats => {
                let s = self.stats.summary();
                writeln!(
                    out,
                    "STATS problems={} avg_auc={:.4} avg_recall100={:.2} avg_available={:.2} avg_dependencies={:.2}",
                    s.problems, s.avg_auc, s.avg_recall100, s.avg_available, s.avg_dependencies
                )?;
            }
            Command::Save => {
                self.save()?;
                writeln!(out, "OK")?;
            }
            Command::Exit => {
                info!("received EXIT, saving model");
                self.save()?;
                return Ok(false);
            }
        }
        Ok(true)
    }
}
