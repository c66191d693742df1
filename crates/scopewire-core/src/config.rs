//! Generator configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Generator configuration
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory scanned for source units
    pub source_root: PathBuf,
    /// Where the plan is written
    pub destination: PathBuf,
    /// File-name suffixes never parsed
    pub excluded_suffixes: Vec<String>,
    /// Relative-path fragments never parsed
    pub excluded_paths: Vec<String>,
    /// Per-unit parse deadline in seconds; 0 waits forever
    pub parse_timeout_secs: u64,
    /// Per-provider synthesis deadline in seconds; 0 waits forever
    pub synthesis_timeout_secs: u64,
    /// Resubmissions after a timed-out sequence
    pub max_retries: u32,
    /// Concurrent steps; 0 means one per available core
    pub max_concurrency: usize,
}

impl GeneratorConfig {
    /// Default configuration scanning `source_root`
    #[inline]
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            ..Self::default()
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or unknown value types
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` on malformed TOML
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    #[inline]
    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = root.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_excluded_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.excluded_suffixes.push(suffix.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_excluded_path(mut self, fragment: impl Into<String>) -> Self {
        self.excluded_paths.push(fragment.into());
        self
    }

    /// With both phase deadlines set to `secs`
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.parse_timeout_secs = secs;
        self.synthesis_timeout_secs = secs;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = workers;
        self
    }

    #[inline]
    #[must_use]
    pub fn parse_timeout(&self) -> Duration {
        Duration::from_secs(self.parse_timeout_secs)
    }

    #[inline]
    #[must_use]
    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            destination: PathBuf::from("scopewire-plan.json"),
            excluded_suffixes: Vec::new(),
            excluded_paths: Vec::new(),
            parse_timeout_secs: 30,
            synthesis_timeout_secs: 30,
            max_retries: 3,
            max_concurrency: 0,
        }
    }
}
