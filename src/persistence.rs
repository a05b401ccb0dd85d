// File: src/persistence.rs
use crate::config::Hyperparameters;
use crate::core::model::ModelStore;
use crate::error::{NbError, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Leading bytes of every snapshot. Anything else is rejected before decoding.
const SNAPSHOT_MAGIC: &[u8; 4] = b"SNB1";

/// Everything needed to bring a model back: the counts and the
/// hyperparameters they were trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub model: ModelStore,
    pub default_prior_weight: f64,
    pub pos_weight: f64,
    pub def_val: f64,
}

impl Snapshot {
    pub fn new(model: ModelStore, params: Hyperparameters) -> Self {
        Self {
            model,
            default_prior_weight: params.default_prior_weight,
            pos_weight: params.pos_weight,
            def_val: params.def_val,
        }
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            default_prior_weight: self.default_prior_weight,
            pos_weight: self.pos_weight,
            def_val: self.def_val,
        }
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

fn decode_error(e: impl std::fmt::Display) -> NbError {
    NbError::Decode { reason: e.to_string() }
}

/// Prefixes `magic` to the bincode encoding of `value`.
pub(crate) fn encode<T: Serialize>(magic: &[u8; 4], value: &T) -> Result<Vec<u8>> {
    let mut blob = magic.to_vec();
    codec()
        .serialize_into(&mut blob, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    Ok(blob)
}

pub(crate) fn decode<T: DeserializeOwned>(magic: &[u8; 4], blob: &[u8]) -> Result<T> {
    let body = blob
        .strip_prefix(magic.as_slice())
        .ok_or_else(|| decode_error("missing snapshot header"))?;
    codec().deserialize(body).map_err(decode_error)
}

/// Replaces `path` with `bytes` in one rename, creating parent directories.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    // Write next to the target so the final rename stays on one filesystem.
    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub(crate) fn read_all(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut blob = Vec::new();
    BufReader::new(file).read_to_end(&mut blob)?;
    Ok(blob)
}

/// Encodes a snapshot as an opaque blob.
pub fn save(snapshot: &Snapshot) -> Result<Vec<u8>> {
    encode(SNAPSHOT_MAGIC, snapshot)
}

/// Decodes a blob produced by `save`. Counts are restored exactly, whether or
/// not they satisfy the model invariants.
pub fn load(blob: &[u8]) -> Result<Snapshot> {
    decode(SNAPSHOT_MAGIC, blob)
}

pub fn save_to_disk(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let blob = save(snapshot)?;
    write_atomically(path, &blob)?;
    debug!(path = %path.display(), bytes = blob.len(), items = snapshot.model.len(), "snapshot written");
    Ok(())
}

pub fn load_from_disk(path: &Path) -> Result<Snapshot> {
    let snapshot = load(&read_all(path)?)?;
    debug!(path = %path.display(), items = snapshot.model.len(), "snapshot loaded");
    Ok(snapshot)
}
