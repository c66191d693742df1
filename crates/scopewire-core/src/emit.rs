//! Plan emission boundary
//!
//! Emitters receive a complete [`GenerationPlan`]; turning it into target
//! source text is the emitter's business.

use crate::error::WriteError;
use scopewire_resolve::GenerationPlan;
use std::path::{Path, PathBuf};

pub trait PlanEmitter: Send + Sync {
    /// Persist the plan
    fn emit(&self, plan: &GenerationPlan) -> Result<(), WriteError>;

    /// Where output goes, if anywhere on disk
    fn destination(&self) -> Option<&Path> {
        None
    }
}

/// Writes the plan as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonPlanEmitter {
    path: PathBuf,
}

impl JsonPlanEmitter {
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Serialized plan without touching the file system
    ///
    /// # Errors
    /// - `WriteError::Serialize` if serialization fails
    pub fn render(plan: &GenerationPlan) -> Result<String, WriteError> {
        Ok(serde_json::to_string_pretty(plan)?)
    }
}

impl PlanEmitter for JsonPlanEmitter {
    fn emit(&self, plan: &GenerationPlan) -> Result<(), WriteError> {
        let text = Self::render(plan)?;
        let io_error = |source: std::io::Error| WriteError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&self.path, text).map_err(io_error)?;

        tracing::info!("Wrote plan to {}", self.path.display());
        Ok(())
    }

    fn destination(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopewire_link::Linker;
    use scopewire_test_utils::game_scenario;

    fn game_plan() -> GenerationPlan {
        let graph = Linker::new(game_scenario()).link().unwrap();
        GenerationPlan::build(&graph).unwrap()
    }

    #[test]
    fn writes_into_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/plan.json");

        JsonPlanEmitter::new(&path).emit(&game_plan()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["scopes"].as_array().unwrap().len(), 4);
        assert!(written["registry"]["providers"]["Root->LoggedIn->ScoreSheet"].is_string());
    }

    #[test]
    fn unwritable_destination_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go.
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();

        let err = JsonPlanEmitter::new(&path).emit(&game_plan()).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
    }
}
