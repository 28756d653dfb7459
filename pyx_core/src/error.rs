//! Error types for engine operations.
//!
//! Only input-contract violations and persistence failures surface here.
//! Missing saved state is recovered by fresh initialization, and mirror
//! failures are logged by the engine and never reach the caller.

use std::fmt;

use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;

/// Result type alias for engine operations
pub type PyxResult<T> = Result<T, PyxError>;

/// Error type for engine operations
#[derive(Debug)]
pub enum PyxError {
    /// Category name outside the closed set of categories
    InvalidCategory { value: String },

    /// Configuration could not be read or violated an invariant
    Config(ConfigError),

    /// Persisted state could not be written, read, or trusted
    Checkpoint(CheckpointError),
}

impl fmt::Display for PyxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyxError::InvalidCategory { value } => write!(
                f,
                "Invalid category '{}': expected one of word, phrase, game_idea",
                value
            ),
            PyxError::Config(err) => write!(f, "Configuration error: {}", err),
            PyxError::Checkpoint(err) => write!(f, "Persistence error: {}", err),
        }
    }
}

impl std::error::Error for PyxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PyxError::InvalidCategory { .. } => None,
            PyxError::Config(err) => Some(err),
            PyxError::Checkpoint(err) => Some(err),
        }
    }
}

impl PyxError {
    pub fn invalid_category(value: impl Into<String>) -> Self {
        PyxError::InvalidCategory {
            value: value.into(),
        }
    }

    /// True when the saved state exists but cannot be used with this engine.
    pub fn is_corrupt_state(&self) -> bool {
        matches!(
            self,
            PyxError::Checkpoint(
                CheckpointError::InvalidFormat(_)
                    | CheckpointError::VersionMismatch { .. }
                    | CheckpointError::Serialization(_)
            )
        )
    }
}

impl From<ConfigError> for PyxError {
    fn from(err: ConfigError) -> Self {
        PyxError::Config(err)
    }
}

impl From<CheckpointError> for PyxError {
    fn from(err: CheckpointError) -> Self {
        PyxError::Checkpoint(err)
    }
}
