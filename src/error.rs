// File: src/error.rs
use crate::core::types::{FeatureId, ItemId};

/// Errors raised by the ranker. All of them are local to the failing call;
/// nothing is retried and nothing is rolled back.
#[derive(Debug, thiserror::Error)]
pub enum NbError {
    #[error("item {item} has no model entry")]
    ItemNotFound { item: ItemId },

    #[error("feature {feature} has no count on item {item}")]
    FeatureNotFound { item: ItemId, feature: FeatureId },

    #[error("training data for item {item} is missing its {what}")]
    MissingTrainingData { item: ItemId, what: &'static str },

    #[error("snapshot decode failed: {reason}")]
    Decode { reason: String },

    #[error("model invariant violated on item {item}: {details}")]
    InvariantViolation { item: ItemId, details: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("malformed command: {reason}")]
    Protocol { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NbError>;
