// File: src/core/predictor.rs
use crate::config::Hyperparameters;
use crate::core::model::ModelStore;
use crate::core::types::{ItemId, ModelEntry, WeightedFeature};
use crate::error::{NbError, Result};

/// Scores candidates against a query with naive Bayes style log-odds.
///
/// For a candidate with positive count `P` the score starts at `ln(P)`. Each
/// query feature `(f, w)` then adds `w * ln(pos_weight * c / P)` where `c` is
/// the candidate's count for `f`, or `w * def_val` when `f` was never seen
/// with the candidate (or its count is exactly zero).
pub struct Predictor<'a> {
    store: &'a ModelStore,
    params: Hyperparameters,
}

impl<'a> Predictor<'a> {
    pub fn new(store: &'a ModelStore, params: Hyperparameters) -> Self {
        Self { store, params }
    }

    /// Relevance of a single candidate. O(|query|).
    pub fn score(&self, item: ItemId, query: &[WeightedFeature]) -> Result<f64> {
        let entry = self.store.entry(item)?;
        score_entry(item, entry, &self.params, query)
    }

    /// Scores every candidate and sorts by descending score. Nothing is
    /// dropped; cutting the list down is up to the consumer. Equal scores keep
    /// their input order.
    pub fn rank(&self, query: &[WeightedFeature], candidates: &[ItemId]) -> Result<Vec<(ItemId, f64)>> {
        let mut ranked = candidates
            .iter()
            .map(|&item| self.score(item, query).map(|score| (item, score)))
            .collect::<Result<Vec<_>>>()?;
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked)
    }
}

fn score_entry(item: ItemId, entry: &ModelEntry, params: &Hyperparameters, query: &[WeightedFeature]) -> Result<f64> {
    let positive = entry.positive_count;
    if positive <= 0.0 {
        return Err(NbError::InvariantViolation {
            item,
            details: format!("positive count {} is not above zero", positive),
        });
    }

    let mut score = positive.ln();
    for &(feature, weight) in query {
        match entry.feature_counts.get(&feature).copied() {
            Some(count) if count != 0.0 => {
                if count < 0.0 || count > positive {
                    return Err(NbError::InvariantViolation {
                        item,
                        details: format!(
                            "feature {} count {} outside [0, {}]",
                            feature, count, positive
                        ),
                    });
                }
                score += weight * (params.pos_weight * count / positive).ln();
            }
            _ => score += weight * params.def_val,
        }
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn params() -> Hyperparameters {
        Hyperparameters { default_prior_weight: 20.0, pos_weight: 10.0, def_val: -15.0 }
    }

    fn entry(positive: f64, counts: &[(usize, f64)]) -> ModelEntry {
        ModelEntry { positive_count: positive, feature_counts: counts.iter().copied().collect::<HashMap<_, _>>() }
    }

    fn store(entries: Vec<(ItemId, ModelEntry)>) -> ModelStore {
        let mut store = ModelStore::new();
        for (item, e) in entries {
            store.insert(item, e);
        }
        store
    }

    #[test]
    fn score_follows_log_odds_formula() {
        let store = store(vec![(1, entry(4.0, &[(0, 2.0), (1, 0.0)]))]);
        let predictor = Predictor::new(&store, params());

        let score = predictor.score(1, &[(0, 0.5), (1, 2.0), (7, 1.0)]).unwrap();
        let expected = 4.0f64.ln() + 0.5 * (10.0f64 * 2.0 / 4.0).ln() + 2.0 * -15.0 + -15.0;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn empty_query_scores_by_prior_evidence() {
        let store = store(vec![(1, entry(3.0, &[])), (2, entry(9.0, &[]))]);
        let ranked = Predictor::new(&store, params()).rank(&[], &[1, 2]).unwrap();
        assert_eq!(ranked[0].0, 2);
        assert!((ranked[0].1 - 9.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn unknown_candidate_is_not_found() {
        let store = store(vec![(1, entry(3.0, &[]))]);
        let err = Predictor::new(&store, params()).rank(&[(0, 1.0)], &[1, 5]).unwrap_err();
        assert!(matches!(err, NbError::ItemNotFound { item: 5 }));
    }

    #[test]
    fn feature_count_above_positive_count_is_reported() {
        let store = store(vec![(1, entry(2.0, &[(0, 3.0)]))]);
        let err = Predictor::new(&store, params()).score(1, &[(0, 1.0)]).unwrap_err();
        assert!(matches!(err, NbError::InvariantViolation { item: 1, .. }));
    }

    #[test]
    fn negative_feature_count_is_reported() {
        let store = store(vec![(1, entry(3.0, &[(0, -1.0)]))]);
        let err = Predictor::new(&store, params()).score(1, &[(0, 1.0)]).unwrap_err();
        assert!(matches!(err, NbError::InvariantViolation { item: 1, .. }));
    }

    #[test]
    fn non_positive_evidence_is_reported() {
        let store = store(vec![(1, entry(0.0, &[]))]);
        let err = Predictor::new(&store, params()).score(1, &[]).unwrap_err();
        assert!(matches!(err, NbError::InvariantViolation { item: 1, .. }));
    }

    #[test]
    fn ties_keep_candidate_order() {
        let store = store(vec![(1, entry(5.0, &[])), (2, entry(5.0, &[])), (3, entry(6.0, &[]))]);
        let ranked = Predictor::new(&store, params()).rank(&[(4, 1.0)], &[2, 1, 3]).unwrap();
        let order: Vec<_> = ranked.iter().map(|&(item, _)| item).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }
}
