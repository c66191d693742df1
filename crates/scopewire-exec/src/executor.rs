//! Bounded sequence executor
//!
//! Each submitted sequence gets a lightweight driver task. Before every step
//! the driver checks the cancel flag and then acquires one permit from the
//! shared semaphore; the step itself runs on the blocking pool and the permit
//! is released as soon as it returns. The continuation is re-queued behind
//! every other waiting sequence, so long chains cannot starve short ones.
//! The flag is checked again once the permit is granted, so a sequence
//! cancelled while queued never runs another step.

use crate::error::ExecError;
use crate::handle::SequenceHandle;
use crate::task::{SequenceId, SequenceTask, Step};
use dashmap::DashMap;
use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Semaphore};

/// Live executor counters
#[derive(Debug, Default)]
pub struct ExecutorStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
    panicked: AtomicU64,
    steps: AtomicU64,
}

/// Point-in-time copy of [`ExecutorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Sequences submitted
    pub submitted: u64,
    /// Sequences that produced a result
    pub completed: u64,
    /// Sequences stopped by `cancel`
    pub cancelled: u64,
    /// Sequences stopped by a panicking step
    pub panicked: u64,
    /// Steps run across all sequences
    pub steps: u64,
}

impl ExecutorStats {
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            steps: self.steps.load(Ordering::Relaxed),
        }
    }
}

/// Scheduler running sequences over a fixed number of permits
#[derive(Debug)]
pub struct SequenceExecutor {
    /// Maximum steps running at once
    limit: usize,
    /// Step permits
    permits: Arc<Semaphore>,
    /// Cancel flags of sequences still running
    live: Arc<DashMap<SequenceId, Arc<AtomicBool>>>,
    next_id: AtomicU64,
    stats: Arc<ExecutorStats>,
}

impl SequenceExecutor {
    /// Create executor with `limit` concurrent steps (at least one)
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        tracing::debug!("Sequence executor with {} permits", limit);
        Self {
            limit,
            permits: Arc::new(Semaphore::new(limit)),
            live: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
            stats: Arc::new(ExecutorStats::default()),
        }
    }

    /// Worker budget
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Sequences not yet finished
    #[inline]
    #[must_use]
    pub fn active(&self) -> usize {
        self.live.len()
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Schedule the first step of a sequence
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn submit<T, S>(&self, first: S) -> SequenceHandle<T>
    where
        T: Send + 'static,
        S: SequenceTask<T>,
    {
        let id = SequenceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancelled = Arc::new(AtomicBool::new(false));
        let steps = Arc::new(AtomicU64::new(0));
        let (sender, receiver) = oneshot::channel();
        let (started_tx, started_rx) = watch::channel(false);

        self.live.insert(id, Arc::clone(&cancelled));
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);

        let driver = Driver {
            id,
            permits: Arc::clone(&self.permits),
            cancelled: Arc::clone(&cancelled),
            steps: Arc::clone(&steps),
            stats: Arc::clone(&self.stats),
            started: started_tx,
        };
        let live = Arc::clone(&self.live);
        tokio::spawn(async move {
            let result = driver.run(Box::new(first)).await;
            live.remove(&id);
            // The handle may already be gone; nobody is left to tell.
            let _ = sender.send(result);
        });

        SequenceHandle::new(id, cancelled, steps, started_rx, receiver)
    }

    /// Request cancellation of every running sequence
    pub fn cancel_all(&self) {
        for entry in self.live.iter() {
            entry.value().store(true, Ordering::Release);
        }
        tracing::debug!("Cancelled {} running sequences", self.live.len());
    }
}

impl Default for SequenceExecutor {
    /// One permit per available core
    fn default() -> Self {
        let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self::new(cores)
    }
}

struct Driver {
    id: SequenceId,
    permits: Arc<Semaphore>,
    cancelled: Arc<AtomicBool>,
    steps: Arc<AtomicU64>,
    stats: Arc<ExecutorStats>,
    /// Flipped once the first step holds a permit
    started: watch::Sender<bool>,
}

impl Driver {
    fn stop(&self) -> ExecError {
        self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("{} cancelled", self.id);
        ExecError::Cancelled(self.id)
    }

    async fn run<T: Send + 'static>(
        self,
        first: Box<dyn SequenceTask<T>>,
    ) -> Result<T, ExecError> {
        let mut current = first;
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return Err(self.stop());
            }

            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                return Err(ExecError::Cancelled(self.id));
            };
            if self.cancelled.load(Ordering::Acquire) {
                drop(permit);
                return Err(self.stop());
            }
            self.started.send_replace(true);
            let outcome = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                current.run()
            })
            .await;

            let step = self.steps.fetch_add(1, Ordering::AcqRel) + 1;
            self.stats.steps.fetch_add(1, Ordering::Relaxed);

            match outcome {
                Ok(Step::Continue(next)) => current = next,
                Ok(Step::Done(value)) => {
                    self.stats.completed.fetch_add(1, Ordering::Relaxed);
                    return Ok(value);
                }
                Err(join) if join.is_panic() => {
                    self.stats.panicked.fetch_add(1, Ordering::Relaxed);
                    let message = panic_message(join.into_panic());
                    tracing::warn!("Step {} of {} panicked: {}", step, self.id, message);
                    return Err(ExecError::StepPanicked {
                        id: self.id,
                        step,
                        message,
                    });
                }
                // Runtime shutting down
                Err(_) => return Err(ExecError::Cancelled(self.id)),
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
