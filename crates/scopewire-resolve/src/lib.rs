//! scopewire Value Resolver and Provider Synthesizer
//!
//! Turns enumerated paths of a frozen scope graph into provider descriptions.
//!
//! # Core Concepts
//!
//! - [`Resolver`]: nearest-ancestor lookup of every required value of a path
//! - [`PluginValidator`]: owner/companion/extension cycle and backing checks
//! - [`group_providers`]: content-based deduplication into [`ProviderGroup`]s
//! - [`ProviderSynthesizer`]: structured [`ProviderDescription`]s for emitters
//! - [`ProviderRegistry`]: per-run path → provider table
//! - [`GenerationPlan`]: everything an emitter needs, in one value
//!
//! # Example
//!
//! ```rust,ignore
//! use scopewire_link::Linker;
//! use scopewire_resolve::GenerationPlan;
//!
//! let graph = Linker::new(declarations).link()?;
//! let plan = GenerationPlan::build(&graph)?;
//! println!("{} providers", plan.providers.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod dedup;
mod error;
mod plugin;
mod registry;
mod resolver;
mod synth;

pub use dedup::{group_providers, ContentKey, ProviderGroup, ProviderId};
pub use error::ResolveError;
pub use plugin::PluginValidator;
pub use registry::ProviderRegistry;
pub use resolver::{Accessor, Provider, Resolver, ValueSource};
pub use synth::{
    AccessorDescription, ExtensionProviderDescription, GenerationPlan, ProviderDescription,
    ProviderSynthesizer, Registration, ScopeMetadata, ScopeRole, ValueBinding,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
