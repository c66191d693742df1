//! Sequence steps

use std::fmt::{self, Debug, Display, Formatter};

/// Identifier of a submitted sequence, unique per executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceId(pub u64);

impl Display for SequenceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "seq-{}", self.0)
    }
}

/// Outcome of running one step
pub enum Step<T> {
    /// Schedule another step of the same sequence
    Continue(Box<dyn SequenceTask<T>>),

    /// The sequence finished with a result
    Done(T),
}

impl<T> Step<T> {
    /// Continue with `task`
    #[inline]
    pub fn next(task: impl SequenceTask<T>) -> Self {
        Self::Continue(Box::new(task))
    }

    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

impl<T: Debug> Debug for Step<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue(_) => f.write_str("Continue(..)"),
            Self::Done(value) => f.debug_tuple("Done").field(value).finish(),
        }
    }
}

/// A single blocking step of a sequence
///
/// Steps run on tokio's blocking pool and may do file I/O or CPU work.
pub trait SequenceTask<T>: Send + 'static {
    fn run(self: Box<Self>) -> Step<T>;
}

impl<T, F> SequenceTask<T> for F
where
    F: FnOnce() -> Step<T> + Send + 'static,
{
    fn run(self: Box<Self>) -> Step<T> {
        (*self)()
    }
}
