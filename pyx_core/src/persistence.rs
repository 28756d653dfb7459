//! Saved engine state: network parameters plus the label list.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checkpoint::{CheckpointError, Checkpointable};
use crate::config::EngineConfig;
use crate::labels::{LabelStore, LabeledItem};
use crate::neural::{NetworkParameters, ScoringNetwork};

const ENGINE_CHECKPOINT_VERSION: u32 = 1;

pub const STATE_FILE_NAME: &str = "pyx_state.bin";

pub fn state_path<P: AsRef<Path>>(data_dir: P) -> PathBuf {
    data_dir.as_ref().join(STATE_FILE_NAME)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    version: u32,
    pub network: NetworkParameters,
    pub labels: Vec<LabeledItem>,
}

impl EngineSnapshot {
    pub fn capture(network: &ScoringNetwork, labels: &LabelStore) -> Self {
        Self {
            version: ENGINE_CHECKPOINT_VERSION,
            network: network.parameters(),
            labels: labels.to_items(),
        }
    }

    /// Rebuilds the in-memory state for `config`.
    ///
    /// A snapshot taken with other layer sizes is rejected instead of reshaped.
    pub fn restore(self, config: &EngineConfig) -> Result<(ScoringNetwork, LabelStore), CheckpointError> {
        let network = ScoringNetwork::from_parameters(
            self.network,
            config.input_size,
            config.hidden_size,
            config.learning_rate,
        )?;
        Ok((network, LabelStore::from_items(self.labels)))
    }
}

impl Checkpointable for EngineSnapshot {
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        Self::write_snapshot(self, path)
    }

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let snapshot: EngineSnapshot = Self::read_snapshot(path)?;
        if snapshot.version != ENGINE_CHECKPOINT_VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: ENGINE_CHECKPOINT_VERSION,
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::staging_path;
    use crate::labels::{Category, Label};
    use std::fs;

    fn temp_path() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("pyx_snapshot_{}.bin", uuid::Uuid::new_v4()));
        path
    }

    fn sample() -> (ScoringNetwork, LabelStore) {
        let network = ScoringNetwork::new(8, 4, 0.15, 3);
        let mut labels = LabelStore::new();
        labels.upsert("moon", Category::Word, Label::Safe, false);
        labels.upsert("gross", Category::Word, Label::Bad, true);
        (network, labels)
    }

    #[test]
    fn checkpoint_roundtrip_is_exact() {
        let (network, labels) = sample();
        let snapshot = EngineSnapshot::capture(&network, &labels);
        let path = temp_path();

        snapshot.save_checkpoint(&path).expect("save checkpoint");
        let restored = EngineSnapshot::load_checkpoint(&path).expect("load checkpoint");
        fs::remove_file(&path).ok();

        assert_eq!(restored, snapshot);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let loaded = EngineSnapshot::load_checkpoint_if_exists(temp_path()).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let (network, labels) = sample();
        let mut snapshot = EngineSnapshot::capture(&network, &labels);
        snapshot.version = 99;
        let path = temp_path();
        EngineSnapshot::write_snapshot(&snapshot, &path).unwrap();

        let err = EngineSnapshot::load_checkpoint(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(
            err,
            CheckpointError::VersionMismatch {
                expected: 1,
                found: 99
            }
        ));
    }

    #[test]
    fn restore_rejects_other_hidden_size() {
        let (network, labels) = sample();
        let snapshot = EngineSnapshot::capture(&network, &labels);
        let config = EngineConfig {
            input_size: 8,
            hidden_size: 5,
            ..EngineConfig::default()
        };
        let err = snapshot.restore(&config).unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidFormat(_)));
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to encode"))
        }
    }

    #[test]
    fn failed_save_keeps_previous_state() {
        let (network, labels) = sample();
        let snapshot = EngineSnapshot::capture(&network, &labels);
        let path = temp_path();
        snapshot.save_checkpoint(&path).unwrap();

        let err = EngineSnapshot::write_snapshot(&Unencodable, &path).unwrap_err();
        assert!(matches!(err, CheckpointError::Serialization(_)));
        assert!(!staging_path(&path).exists());

        let restored = EngineSnapshot::load_checkpoint(&path).expect("previous state survives");
        fs::remove_file(&path).ok();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn save_replaces_existing_state() {
        let (network, mut labels) = sample();
        let path = temp_path();
        EngineSnapshot::capture(&network, &labels)
            .save_checkpoint(&path)
            .unwrap();

        labels.upsert("comet", Category::Word, Label::Safe, false);
        let newer = EngineSnapshot::capture(&network, &labels);
        newer.save_checkpoint(&path).unwrap();

        let restored = EngineSnapshot::load_checkpoint(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(restored, newer);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn garbage_file_fails_to_decode() {
        let path = temp_path();
        fs::write(&path, b"\x01\x00").unwrap();
        let err = EngineSnapshot::load_checkpoint(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, CheckpointError::Serialization(_)));
    }
}
