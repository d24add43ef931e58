//! Durable resume checkpoint.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::error::EnrichmentError;
use crate::input::AddressRecord;

/// Single-line checkpoint file naming the last fully processed address.
///
/// The file is overwritten and synced after every processed record; its
/// absence at startup means "start from the first record".
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Read the last processed address, if a checkpoint exists.
    pub fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).context("failed to read checkpoint file"),
        }
    }

    /// Overwrite the checkpoint with `address` and sync it to disk.
    pub fn save(&self, address: &str) -> Result<()> {
        let mut file = File::create(&self.path)?;
        file.write_all(address.as_bytes())?;
        file.sync_all()?;
        debug!("Checkpoint advanced to {}", address);
        Ok(())
    }
}

/// Index of the first record to process given a checkpointed address.
///
/// Returns the position immediately after the checkpointed address, or a
/// stale-checkpoint error when that address is not in the input list.
pub fn resume_index(inputs: &[AddressRecord], last: &str) -> Result<usize, EnrichmentError> {
    match inputs.iter().position(|record| record.address == last) {
        Some(index) => Ok(index + 1),
        None => Err(EnrichmentError::StaleCheckpoint(last.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(addresses: &[&str]) -> Vec<AddressRecord> {
        addresses
            .iter()
            .map(|address| AddressRecord {
                address: address.to_string(),
                label: None,
            })
            .collect()
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint.txt"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint.txt"));

        store.save("0xaaa").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("0xaaa"));

        store.save("0xbbb").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("0xbbb"));
    }

    #[test]
    fn test_resume_index_is_position_after_checkpoint() {
        let inputs = inputs(&["A", "B", "C"]);
        assert_eq!(resume_index(&inputs, "A").unwrap(), 1);
        assert_eq!(resume_index(&inputs, "C").unwrap(), 3);
    }

    #[test]
    fn test_resume_index_stale_checkpoint() {
        let inputs = inputs(&["A", "B", "C"]);
        let err = resume_index(&inputs, "Z").unwrap_err();
        assert!(matches!(err, EnrichmentError::StaleCheckpoint(key) if key == "Z"));
    }
}
