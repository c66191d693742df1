//! scopewire Task-Sequencing Engine
//!
//! Runs many independent *sequences* of blocking steps over a fixed worker
//! budget. Each step decides what runs next; nothing pins a sequence to a
//! worker between steps.
//!
//! # Core Concepts
//!
//! - [`SequenceTask`]: one step, returning [`Step::Continue`] or [`Step::Done`]
//! - [`SequenceExecutor`]: semaphore-bounded scheduler over tokio's blocking pool
//! - [`SequenceHandle`]: `wait(timeout)` and cooperative `cancel()`
//!
//! # Example
//!
//! ```rust,ignore
//! use scopewire_exec::{SequenceExecutor, Step};
//! use std::time::Duration;
//!
//! let executor = SequenceExecutor::new(4);
//! let mut handle = executor.submit(|| Step::next(|| Step::Done(42)));
//! let value = handle.wait(Some(Duration::from_secs(1))).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod executor;
mod handle;
mod task;

pub use error::ExecError;
pub use executor::{ExecutorStats, SequenceExecutor, StatsSnapshot};
pub use handle::SequenceHandle;
pub use task::{SequenceId, SequenceTask, Step};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
