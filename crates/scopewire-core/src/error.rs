//! Error types for the generator pipeline
//!
//! Everything except a single unit's parse failure aborts the run; no
//! partial plan is ever written.

use scopewire_exec::ExecError;
use scopewire_link::LinkingError;
use scopewire_resolve::ResolveError;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Executor-driven phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Parse,
    Synthesis,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => f.write_str("parsing"),
            Self::Synthesis => f.write_str("synthesis"),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Plan could not be persisted
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize plan: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Main generator error type
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source root missing or unreadable
    #[error("cannot scan {}: {source}", root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("linking failed: {0}")]
    Linking(#[from] LinkingError),

    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("execution failed: {0}")]
    Exec(#[from] ExecError),

    #[error("write failed: {0}")]
    Write(#[from] WriteError),

    /// A sequence kept timing out
    #[error("{phase} of '{unit}' timed out after {attempts} attempts")]
    RetriesExhausted {
        phase: Phase,
        unit: String,
        attempts: u32,
    },
}

impl GeneratorError {
    /// Whether resubmitting the failed sequence may help
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Exec(err) if err.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopewire_exec::SequenceId;

    #[test]
    fn only_timeouts_retry() {
        let timeout = GeneratorError::from(ExecError::AwaitTimeout {
            id: SequenceId(0),
            waited_ms: 10,
        });
        assert!(timeout.is_retryable());

        let cancelled = GeneratorError::from(ExecError::Cancelled(SequenceId(0)));
        assert!(!cancelled.is_retryable());
    }

    #[test]
    fn exhausted_message() {
        let err = GeneratorError::RetriesExhausted {
            phase: Phase::Parse,
            unit: "app/root.scope.json".to_string(),
            attempts: 4,
        };
        assert_eq!(
            err.to_string(),
            "parsing of 'app/root.scope.json' timed out after 4 attempts"
        );
    }
}
