//! Saving and loading of persisted engine state.
//!
//! Everything goes through one fixed bincode configuration, so identical
//! state always produces identical bytes. Writes land in a sibling `.tmp`
//! file that is synced and then renamed over the target: a save either
//! replaces the previous state completely or leaves it untouched.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use bincode::Options;

/// Failure to save or restore persisted state.
#[derive(Debug)]
pub enum CheckpointError {
    /// The state file could not be read, written, or renamed into place.
    Io(std::io::Error),
    /// The binary codec rejected the payload.
    Serialization(bincode::Error),
    /// The file carries a schema version this build does not understand.
    VersionMismatch { expected: u32, found: u32 },
    /// The payload decoded but does not fit the current engine (e.g. weight dimensions).
    InvalidFormat(String),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(err) => write!(f, "state file I/O failed: {err}"),
            CheckpointError::Serialization(err) => {
                write!(f, "state file could not be encoded or decoded: {err}")
            }
            CheckpointError::VersionMismatch { expected, found } => write!(
                f,
                "state file version {found} is not supported (expected {expected})",
            ),
            CheckpointError::InvalidFormat(msg) => {
                write!(f, "state file does not fit this engine: {msg}")
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(err: std::io::Error) -> Self {
        CheckpointError::Io(err)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(err: bincode::Error) -> Self {
        CheckpointError::Serialization(err)
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_little_endian()
}

/// `<path>.tmp`, next to the target so the final rename stays on one filesystem.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut staged = OsString::from(path.as_os_str());
    staged.push(".tmp");
    PathBuf::from(staged)
}

fn encode_to<T: serde::Serialize>(path: &Path, snapshot: &T) -> Result<(), CheckpointError> {
    let mut writer = BufWriter::new(File::create(path)?);
    codec().serialize_into(&mut writer, snapshot)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Components that persist themselves through the shared codec.
pub trait Checkpointable: Sized {
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError>;

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError>;

    /// Like [`Checkpointable::load_checkpoint`], but a missing file yields `Ok(None)`.
    fn load_checkpoint_if_exists<P: AsRef<Path>>(path: P) -> Result<Option<Self>, CheckpointError> {
        match Self::load_checkpoint(path) {
            Ok(state) => Ok(Some(state)),
            Err(CheckpointError::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Encodes `snapshot` and atomically replaces `path` with it.
    ///
    /// On failure the staging file is removed and any previous file at
    /// `path` is still intact.
    fn write_snapshot<P, T>(snapshot: &T, path: P) -> Result<(), CheckpointError>
    where
        P: AsRef<Path>,
        T: serde::Serialize,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staged = staging_path(path);
        if let Err(err) = encode_to(&staged, snapshot) {
            fs::remove_file(&staged).ok();
            return Err(err);
        }
        fs::rename(&staged, path)?;
        Ok(())
    }

    fn read_snapshot<P, T>(path: P) -> Result<T, CheckpointError>
    where
        P: AsRef<Path>,
        T: serde::de::DeserializeOwned,
    {
        let mut reader = BufReader::new(File::open(path)?);
        Ok(codec().deserialize_from(&mut reader)?)
    }
}
