//! Source discovery
//!
//! Walks the source root and returns every regular file not excluded by
//! suffix or path fragment, sorted by relative path so runs are repeatable.

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::source::SourceUnit;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct SourceDiscovery {
    root: PathBuf,
    excluded_suffixes: Vec<String>,
    excluded_paths: Vec<String>,
}

impl SourceDiscovery {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_suffixes: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }

    /// Discovery over the configured root and exclusions
    #[must_use]
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            root: config.source_root.clone(),
            excluded_suffixes: config.excluded_suffixes.clone(),
            excluded_paths: config.excluded_paths.clone(),
        }
    }

    #[must_use]
    pub fn with_excluded_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.excluded_suffixes.push(suffix.into());
        self
    }

    #[must_use]
    pub fn with_excluded_path(mut self, fragment: impl Into<String>) -> Self {
        self.excluded_paths.push(fragment.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All candidate units under the root
    ///
    /// # Errors
    /// - `GeneratorError::Discovery` if the root itself cannot be read;
    ///   unreadable entries below it are skipped
    pub fn discover(&self) -> Result<Vec<SourceUnit>, GeneratorError> {
        let mut units = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(GeneratorError::Discovery {
                        root: self.root.clone(),
                        source,
                    });
                }
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_path(&self.root, entry.path());
            if self.is_excluded(&relative) {
                tracing::debug!("Excluded {}", relative);
                continue;
            }
            units.push(SourceUnit::new(entry.path(), relative));
        }

        units.sort_by(|a, b| a.relative.cmp(&b.relative));
        tracing::info!("Discovered {} source units under {}", units.len(), self.root.display());
        Ok(units)
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.excluded_suffixes
            .iter()
            .any(|suffix| relative.ends_with(suffix.as_str()))
            || self
                .excluded_paths
                .iter()
                .any(|fragment| relative.contains(fragment.as_str()))
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
