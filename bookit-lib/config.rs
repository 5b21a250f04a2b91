//! User configuration loaded from `config.toml`.

use std::{
  path::{
    Path,
    PathBuf,
  },
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

pub const DEFAULT_ACTIVATION_DELAY_MS: u64 = 150;
pub const DEFAULT_MAX_POTENTIAL_MATCHES: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Io {
    path:   PathBuf,
    source: std::io::Error,
  },
  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShortcutConfig {
  /// Time the confirmation state stays visible before navigating.
  pub activation_delay_ms:   u64,
  /// Number of potential matches offered for selection.
  pub max_potential_matches: usize,
}

impl Default for ShortcutConfig {
  fn default() -> Self {
    Self {
      activation_delay_ms:   DEFAULT_ACTIVATION_DELAY_MS,
      max_potential_matches: DEFAULT_MAX_POTENTIAL_MATCHES,
    }
  }
}

impl ShortcutConfig {
  #[must_use]
  pub const fn activation_delay(&self) -> Duration {
    Duration::from_millis(self.activation_delay_ms)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReorderConfig {
  pub enabled: bool,
}

impl Default for ReorderConfig {
  fn default() -> Self {
    Self { enabled: true }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub shortcuts: ShortcutConfig,
  pub reorder:   ReorderConfig,
}

impl Config {
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  /// Load `path`, falling back to defaults when it does not exist.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    match std::fs::read_to_string(path) {
      Ok(source) => Self::from_toml_str(&source),
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Self::default())
      },
      Err(source) => {
        Err(ConfigError::Io {
          path: path.to_path_buf(),
          source,
        })
      },
    }
  }
}
