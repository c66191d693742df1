//! Executor errors

use crate::task::SequenceId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    /// The deadline elapsed before the sequence finished; it keeps running
    #[error("{id} did not complete within {waited_ms}ms")]
    AwaitTimeout { id: SequenceId, waited_ms: u64 },

    /// The sequence was cancelled before its next step
    #[error("{0} was cancelled")]
    Cancelled(SequenceId),

    /// A step panicked; no further steps run
    #[error("step {step} of {id} panicked: {message}")]
    StepPanicked {
        id: SequenceId,
        step: u64,
        message: String,
    },

    /// `wait` was called again after the result was handed out
    #[error("result of {0} was already taken")]
    ResultTaken(SequenceId),
}

impl ExecError {
    /// Only timeouts are worth retrying
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::AwaitTimeout { .. })
    }

    #[inline]
    #[must_use]
    pub fn sequence(&self) -> SequenceId {
        match self {
            Self::AwaitTimeout { id, .. } | Self::StepPanicked { id, .. } => *id,
            Self::Cancelled(id) | Self::ResultTaken(id) => *id,
        }
    }
}
