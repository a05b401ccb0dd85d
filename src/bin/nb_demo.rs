// Walks the classifier through a tiny training run and prints the model.
// Run with: cargo run --bin nb_demo
use nb_core::config::Hyperparameters;
use nb_core::core::types::TrainingDicts;
use nb_core::persistence;
use nb_core::{RankerEngine, Result};

fn print_model(engine: &RankerEngine, items: &[usize]) {
    for &item in items {
        if let Some(entry) = engine.entry(item) {
            let mut counts: Vec<_> = entry.feature_counts.iter().collect();
            counts.sort_by_key(|(feature, _)| **feature);
            println!("  {} => positive {} features {:?}", item, entry.positive_count, counts);
        }
    }
}

fn main() -> Result<()> {
    let mut dicts = TrainingDicts::default();
    dicts.features.insert(0, vec![(0, 1.0), (1, 1.0), (2, 1.0)]);
    dicts.features.insert(1, vec![(3, 1.0), (2, 1.0), (1, 1.0)]);
    dicts.dependencies.insert(0, vec![0]);
    dicts.dependencies.insert(1, vec![0, 1]);

    let mut engine = RankerEngine::new(Hyperparameters::default());
    engine.initialize(&[0, 1], &dicts)?;
    engine.update(2, &[(14, 1.0), (1, 1.0), (3, 1.0)], &[0, 2])?;
    println!("Model after initialize + update:");
    print_model(&engine, &[0, 1, 2]);

    println!("Ranking for features [0, 14]:");
    for (item, score) in engine.predict(&[(0, 1.0), (14, 1.0)], &[0, 1, 2])? {
        println!("  {} (score: {:.4})", item, score);
    }

    let restored = RankerEngine::from_snapshot(persistence::load(&persistence::save(&engine.snapshot())?)?);
    println!("Restored copy identical: {}", restored.snapshot() == engine.snapshot());
    Ok(())
}
