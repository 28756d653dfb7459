//! Engine configuration management via TOML files.
//!
//! Every key of the `[engine]` section is optional and falls back to the
//! defaults below. Values are validated once at load time; an engine never
//! sees an out-of-range setting.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Engine configuration loaded from TOML file.
///
/// # Examples
///
/// ```
/// use pyx_core::EngineConfig;
///
/// let config = EngineConfig::load_from_file("config/engine.toml")
///     .unwrap_or_else(|_| EngineConfig::default());
///
/// println!("Ban line: {}", config.ban_line);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    /// Step size applied to every gradient update
    pub learning_rate: f32,
    /// Width of the hidden layer
    pub hidden_size: usize,
    /// Length of the feature vectors produced by the encoder
    pub input_size: usize,
    /// Scores at or above this value are inappropriate
    pub ban_line: f32,
    /// Seed for deterministic weight initialization
    pub seed: u64,
    /// Number of training steps performed by one explicit train/override
    pub train_epochs: usize,
    /// Directory holding the persisted engine state
    pub data_dir: PathBuf,
    /// Append every decision to `<data_dir>/logs/decisions.jsonl`
    pub decision_log: bool,
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        Self::from_str(&contents)
    }

    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::from_raw(raw.engine)
    }

    /// Returns a copy of this configuration rooted at another data directory.
    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Checks every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::Invalid(
                "engine.learning_rate must be positive".into(),
            ));
        }
        if self.hidden_size == 0 {
            return Err(ConfigError::Invalid(
                "engine.hidden_size must be ≥ 1".into(),
            ));
        }
        if self.input_size == 0 {
            return Err(ConfigError::Invalid("engine.input_size must be ≥ 1".into()));
        }
        if !self.ban_line.is_finite() || !(0.0..=1.0).contains(&self.ban_line) {
            return Err(ConfigError::Invalid(
                "engine.ban_line must lie in [0, 1]".into(),
            ));
        }
        if self.train_epochs == 0 {
            return Err(ConfigError::Invalid(
                "engine.train_epochs must be ≥ 1".into(),
            ));
        }
        Ok(())
    }

    fn from_raw(raw: RawEngineSection) -> Result<Self, ConfigError> {
        let config = Self {
            learning_rate: raw.learning_rate,
            hidden_size: raw.hidden_size,
            input_size: raw.input_size,
            ban_line: raw.ban_line,
            seed: raw.seed,
            train_epochs: raw.train_epochs,
            data_dir: raw.data_dir,
            decision_log: raw.decision_log,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            hidden_size: default_hidden_size(),
            input_size: default_input_size(),
            ban_line: default_ban_line(),
            seed: default_seed(),
            train_epochs: default_train_epochs(),
            data_dir: default_data_dir(),
            decision_log: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    engine: RawEngineSection,
}

#[derive(Debug, Deserialize)]
struct RawEngineSection {
    #[serde(default = "default_learning_rate")]
    learning_rate: f32,
    #[serde(default = "default_hidden_size")]
    hidden_size: usize,
    #[serde(default = "default_input_size")]
    input_size: usize,
    #[serde(default = "default_ban_line")]
    ban_line: f32,
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_train_epochs")]
    train_epochs: usize,
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default)]
    decision_log: bool,
}

impl Default for RawEngineSection {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            hidden_size: default_hidden_size(),
            input_size: default_input_size(),
            ban_line: default_ban_line(),
            seed: default_seed(),
            train_epochs: default_train_epochs(),
            data_dir: default_data_dir(),
            decision_log: false,
        }
    }
}

fn default_learning_rate() -> f32 {
    0.15
}

fn default_hidden_size() -> usize {
    32
}

fn default_input_size() -> usize {
    64
}

fn default_ban_line() -> f32 {
    0.7
}

fn default_seed() -> u64 {
    42
}

fn default_train_epochs() -> usize {
    5
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
            ConfigError::Invalid(err) => write!(f, "Invalid configuration: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_section_missing() {
        let config = EngineConfig::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.hidden_size, 32);
        assert_eq!(config.ban_line, 0.7);
    }

    #[test]
    fn parses_custom_values() {
        let toml = "[engine]\nlearning_rate = 0.3\nhidden_size = 16\nban_line = 0.5\ndata_dir = \"/tmp/pyx\"\ndecision_log = true";
        let config = EngineConfig::from_str(toml).unwrap();
        assert_eq!(config.learning_rate, 0.3);
        assert_eq!(config.hidden_size, 16);
        assert_eq!(config.input_size, 64);
        assert_eq!(config.ban_line, 0.5);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/pyx"));
        assert!(config.decision_log);
    }

    #[test]
    fn rejects_ban_line_out_of_range() {
        let err = EngineConfig::from_str("[engine]\nban_line = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("ban_line")));
    }

    #[test]
    fn rejects_zero_hidden_size() {
        let err = EngineConfig::from_str("[engine]\nhidden_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = EngineConfig::from_str("[engine\nban_line = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn shipped_config_file_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/engine.toml");
        let config = EngineConfig::load_from_file(path).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
