// src/core/mod.rs

pub mod engine;
pub mod model;
pub mod predictor;
pub mod types;
