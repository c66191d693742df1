//! Source units and the parser boundary

use scopewire_model::Declarations;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// One file considered for parsing
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceUnit {
    /// Absolute or root-joined path
    pub path: PathBuf,
    /// Path relative to the source root, `/`-separated
    pub relative: String,
}

impl SourceUnit {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
        }
    }

    /// File name, empty when the path has none
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

impl Display for SourceUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

/// Per-unit parse failure; the unit is skipped, the run continues
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON manifest {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML manifest {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no parser for {}", path.display())]
    Unsupported { path: PathBuf },
}

/// Extracts scope declarations from one source unit
///
/// Implement this trait to plug in a real source-language front end.
pub trait DeclarationParser: Send + Sync + 'static {
    /// Cheap pre-filter, run before the unit is read
    fn accepts(&self, unit: &SourceUnit) -> bool;

    /// Parse the unit's text; `Ok(None)` means nothing relevant was declared
    fn parse(&self, unit: &SourceUnit, text: &str) -> Result<Option<Declarations>, ParseError>;
}

/// Reads `*.scope.json` and `*.scope.toml` declaration manifests
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestParser;

impl ManifestParser {
    pub const JSON_SUFFIX: &'static str = ".scope.json";
    pub const TOML_SUFFIX: &'static str = ".scope.toml";

    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DeclarationParser for ManifestParser {
    fn accepts(&self, unit: &SourceUnit) -> bool {
        let name = unit.file_name();
        name.ends_with(Self::JSON_SUFFIX) || name.ends_with(Self::TOML_SUFFIX)
    }

    fn parse(&self, unit: &SourceUnit, text: &str) -> Result<Option<Declarations>, ParseError> {
        let path = unit.path.clone();
        let name = unit.file_name();

        let declarations: Declarations = if name.ends_with(Self::JSON_SUFFIX) {
            serde_json::from_str(text).map_err(|source| ParseError::Json { path, source })?
        } else if name.ends_with(Self::TOML_SUFFIX) {
            toml::from_str(text).map_err(|source| ParseError::Toml { path, source })?
        } else {
            return Err(ParseError::Unsupported { path });
        };

        Ok((!declarations.is_empty()).then_some(declarations))
    }
}
