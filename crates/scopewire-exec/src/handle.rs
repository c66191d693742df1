//! Execution handles

use crate::error::ExecError;
use crate::task::SequenceId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

/// Caller side of a submitted sequence
#[derive(Debug)]
pub struct SequenceHandle<T> {
    id: SequenceId,
    cancelled: Arc<AtomicBool>,
    steps: Arc<AtomicU64>,
    started: watch::Receiver<bool>,
    /// `None` once the result was handed out
    receiver: Option<oneshot::Receiver<Result<T, ExecError>>>,
}

impl<T> SequenceHandle<T> {
    pub(crate) fn new(
        id: SequenceId,
        cancelled: Arc<AtomicBool>,
        steps: Arc<AtomicU64>,
        started: watch::Receiver<bool>,
        receiver: oneshot::Receiver<Result<T, ExecError>>,
    ) -> Self {
        Self {
            id,
            cancelled,
            steps,
            started,
            receiver: Some(receiver),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SequenceId {
        self.id
    }

    /// Resolve once the first step was granted a permit
    ///
    /// Also resolves when the sequence ended without ever starting, for
    /// example after a cancel while queued. Lets callers start a deadline at
    /// the moment the work begins rather than when it was submitted.
    pub async fn started(&self) {
        let mut started = self.started.clone();
        // Err only means the driver is gone; either way nothing is pending.
        let _ = started.wait_for(|started| *started).await;
    }

    #[inline]
    #[must_use]
    pub fn has_started(&self) -> bool {
        *self.started.borrow()
    }

    /// Wait for the result, at most `timeout` if given
    ///
    /// A timeout leaves the sequence running and the handle usable; wait
    /// again, or cancel first.
    ///
    /// # Errors
    /// - `ExecError::AwaitTimeout` if the deadline elapsed first
    /// - `ExecError::Cancelled` if the sequence was cancelled
    /// - `ExecError::StepPanicked` if a step panicked
    /// - `ExecError::ResultTaken` on a second call after a result
    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<T, ExecError> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Err(ExecError::ResultTaken(self.id));
        };

        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    return Err(ExecError::AwaitTimeout {
                        id: self.id,
                        waited_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    })
                }
            },
            None => receiver.await,
        };

        self.receiver = None;
        received.unwrap_or(Err(ExecError::Cancelled(self.id)))
    }

    /// Stop scheduling further steps; a step already running completes
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Steps of this sequence that have finished running
    #[inline]
    #[must_use]
    pub fn steps_completed(&self) -> u64 {
        self.steps.load(Ordering::Acquire)
    }
}
