//! scopewire Tree Linker and Path Enumerator
//!
//! Two-phase construction of the scope graph:
//! 1. **Linking** ([`Linker`]): index every declaration by name, turn textual
//!    references into arena indices, validate the structure
//! 2. **Frozen graph** ([`ScopeGraph`]): read-only, shareable across threads
//!
//! [`PathEnumerator`] then walks the frozen graph and produces one
//! [`PathRecord`] per distinct root-to-scope walk.
//!
//! # Example
//!
//! ```rust,ignore
//! use scopewire_link::{Linker, PathEnumerator};
//!
//! let graph = Linker::new(declarations).link()?;
//! for record in PathEnumerator::new(&graph).enumerate() {
//!     println!("{}", graph.path_string(&record.path));
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod graph;
mod linker;
mod paths;

pub use error::LinkingError;
pub use graph::ScopeGraph;
pub use linker::Linker;
pub use paths::{PathEnumerator, PathFamily, PathId, PathRecord};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
