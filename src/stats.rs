// File: src/stats.rs
use crate::core::types::ItemId;
use crate::error::Result;
use crate::persistence::{decode, encode, read_all, write_atomically};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

const STATISTICS_MAGIC: &[u8; 4] = b"SNS1";

/// Quality of a single ranking measured against the items actually needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Fraction of (needed, not needed) pairs ranked in the right order.
    pub auc: f64,
    /// 1-based rank at which the last needed item shows up. One past the end
    /// of the list if some needed item was not ranked at all.
    pub recall100: usize,
    pub needed: usize,
    pub available: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub avg_auc: f64,
    pub avg_recall100: f64,
    pub avg_available: f64,
    pub avg_dependencies: f64,
    pub problems: usize,
}

/// Accumulates ranking quality over a stream of prediction problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    cutoff: usize,
    problems: usize,
    auc_sum: f64,
    recall100_sum: f64,
    available_sum: f64,
    dependency_sum: f64,
    /// recall_data[i]: summed fraction of needed items found in the top i+1.
    recall_data: Vec<f64>,
    /// recall100_data[i]: problems fully recalled within the top i+1.
    recall100_data: Vec<usize>,
    auc_data: Vec<f64>,
    premise_occurrences: HashMap<ItemId, usize>,
    first_appearance: HashMap<ItemId, usize>,
    appearance_gaps: Vec<usize>,
}

impl Statistics {
    pub fn new(cutoff: usize) -> Self {
        Self {
            cutoff,
            problems: 0,
            auc_sum: 0.0,
            recall100_sum: 0.0,
            available_sum: 0.0,
            dependency_sum: 0.0,
            recall_data: vec![0.0; cutoff],
            recall100_data: vec![0; cutoff],
            auc_data: Vec::new(),
            premise_occurrences: HashMap::new(),
            first_appearance: HashMap::new(),
            appearance_gaps: Vec::new(),
        }
    }

    /// Scores one ranking (best first) against its needed `dependencies`.
    /// Problems without dependencies are skipped and return `None`.
    pub fn update(&mut self, predictions: &[ItemId], dependencies: &[ItemId], statement: usize) -> Option<Evaluation> {
        let needed: HashSet<ItemId> = dependencies.iter().copied().collect();
        if needed.is_empty() {
            debug!(statement, "no dependencies, skipping statistics");
            return None;
        }

        let available = predictions.len();
        let predictions = &predictions[..available.min(self.cutoff)];
        // Ranks past the end of a short list count as fully recalled.
        for i in predictions.len()..self.cutoff {
            self.recall_data[i] += 1.0;
            self.recall100_data[i] += 1;
        }

        for &dep in &needed {
            *self.premise_occurrences.entry(dep).or_insert(0) += 1;
            match self.first_appearance.get(&dep) {
                Some(&first) => self.appearance_gaps.push(statement.saturating_sub(first)),
                None => {
                    self.first_appearance.insert(dep, statement);
                }
            }
        }

        let needed_count = needed.len();
        let mut found = 0usize;
        let mut misses = 0usize;
        let mut ordered_pairs = 0usize;
        let mut recall100 = 0usize;
        for (index, item) in predictions.iter().enumerate() {
            if needed.contains(item) {
                found += 1;
                recall100 = index + 1;
            } else {
                ordered_pairs += found;
                misses += 1;
            }
            if found == needed_count {
                self.recall100_data[index] += 1;
            }
            self.recall_data[index] += found as f64 / needed_count as f64;
        }

        let mut positives = found;
        if found < needed_count {
            let missing = needed_count - found;
            debug!(statement, missing, "dependencies missing from ranking");
            positives += missing;
            recall100 = predictions.len() + 1;
        }

        let auc = if positives == 0 || misses == 0 {
            1.0
        } else {
            ordered_pairs as f64 / (misses * positives) as f64
        };

        self.auc_data.push(auc);
        self.auc_sum += auc;
        self.recall100_sum += recall100 as f64;
        self.available_sum += available as f64;
        self.dependency_sum += needed_count as f64;
        self.problems += 1;

        let auc_percent = (10_000.0 * auc).round() / 100.0;
        info!(
            statement,
            auc = auc_percent,
            needed = needed_count,
            recall100,
            available,
            cutoff = self.cutoff,
            "ranking evaluated"
        );
        Some(Evaluation { auc, recall100, needed: needed_count, available })
    }

    pub fn summary(&self) -> Summary {
        let n = self.problems.max(1) as f64;
        Summary {
            avg_auc: self.auc_sum / n,
            avg_recall100: self.recall100_sum / n,
            avg_available: self.available_sum / n,
            avg_dependencies: self.dependency_sum / n,
            problems: self.problems,
        }
    }

    /// Average recall at each rank up to the cutoff.
    pub fn recall_curve(&self) -> Vec<f64> {
        let n = self.problems.max(1) as f64;
        self.recall_data.iter().map(|r| r / n).collect()
    }

    pub fn full_recall_counts(&self) -> &[usize] {
        &self.recall100_data
    }

    /// Persists the accumulated statistics so a later run can continue them.
    pub fn save_to_disk(&self, path: &Path) -> Result<()> {
        write_atomically(path, &encode(STATISTICS_MAGIC, self)?)?;
        debug!(path = %path.display(), problems = self.problems, "statistics written");
        Ok(())
    }

    pub fn load_from_disk(path: &Path) -> Result<Self> {
        let stats: Self = decode(STATISTICS_MAGIC, &read_all(path)?)?;
        debug!(path = %path.display(), problems = stats.problems, "statistics loaded");
        Ok(stats)
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// How often each item was needed across all evaluated problems.
    pub fn premise_occurrences(&self) -> &HashMap<ItemId, usize> {
        &self.premise_occurrences
    }

    /// Statements elapsed between an item's first use and each later use.
    pub fn appearance_gaps(&self) -> &[usize] {
        &self.appearance_gaps
    }
}
