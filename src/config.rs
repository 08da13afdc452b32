//! Configuration file loader describing how references are rewritten.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::options::{DEFAULT_QUERY_KEY, RewriteOptions, default_tag_attributes};

/// Configuration file searched for by [`CachebustConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "cachebust.config.json";

/// Discoverable configuration mirroring the `path`, `key` and `tags` call options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CachebustConfig {
  /// Base directory for mtime lookups. Empty disables lookups.
  pub path: String,
  /// Query parameter name.
  pub key: String,
  /// Tag name to attribute name, scanned in file order.
  pub tags: IndexMap<String, String>,
}

impl Default for CachebustConfig {
  fn default() -> Self {
    Self {
      path: String::new(),
      key: DEFAULT_QUERY_KEY.into(),
      tags: default_tag_attributes(),
    }
  }
}

/// Errors that can occur while loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
  /// Failed to read the configuration file from disk.
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON configuration file.
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl CachebustConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// Missing or malformed files fall back to the defaults.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    match Self::load_from_path(&candidate) {
      Ok(config) => config,
      Err(err) => {
        log::warn!("{err}; using default configuration");
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file. A missing file yields the defaults.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Ok(Self::default());
      }
      Err(err) => {
        return Err(ConfigError::Io {
          path: path.to_path_buf(),
          source: err,
        });
      }
    };

    serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
      path: path.to_path_buf(),
      source: err,
    })
  }

  /// Convert into call options. Empty values keep the built-in defaults.
  pub fn to_options(&self) -> RewriteOptions {
    RewriteOptions::with_base_path(&self.path)
      .query_key(self.key.as_str())
      .tag_attributes(self.tags.clone())
  }
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io { path, source } => {
        write!(f, "failed to read {}: {}", path.display(), source)
      }
      Self::Parse { path, source } => {
        write!(f, "failed to parse {}: {}", path.display(), source)
      }
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io { source, .. } => Some(source),
      Self::Parse { source, .. } => Some(source),
    }
  }
}
