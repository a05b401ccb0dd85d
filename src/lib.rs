// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod learning;
pub mod persistence;
pub mod protocol;
pub mod session;
pub mod stats;

pub use crate::core::engine::RankerEngine;
pub use crate::error::{NbError, Result};
