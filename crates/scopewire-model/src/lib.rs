//! scopewire Node Model
//!
//! Value objects shared by every stage of a generation run.
//!
//! # Core Concepts
//!
//! - [`Value`]: a named, typed unit a scope supplies or requires
//! - [`Contract`]: the set of values a scope requires from its ancestors
//! - [`ScopeDecl`]: a scope as handed over by the declaration parser
//! - [`Declarations`]: everything one source unit (or a whole run) declares
//! - [`Scope`] / [`ScopeId`]: a linked, read-only scope inside a frozen graph
//! - [`ScopePath`]: one concrete root-to-scope walk
//!
//! The declaration types are the mutable, parser-facing stage. The resolved
//! types are produced by `scopewire-link` and never change afterwards.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod contract;
mod error;
mod scope;
mod value;

pub use contract::{Contract, EMPTY_CONTRACT_NAME};
pub use error::ModelError;
pub use scope::{
    Declarations, PluginDecl, PluginLink, Scope, ScopeDecl, ScopeId, ScopeKind, ScopePath,
};
pub use value::Value;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
