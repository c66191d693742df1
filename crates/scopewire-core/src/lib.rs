//! scopewire generator pipeline
//!
//! Wires discovery, parsing, linking, resolution and synthesis into one run.
//!
//! # Core Concepts
//!
//! - [`GeneratorConfig`]: source root, exclusions, timeouts, retries, workers
//! - [`SourceDiscovery`]: ordered source units under a root
//! - [`DeclarationParser`]: per-unit declaration extraction ([`ManifestParser`])
//! - [`Generator`]: the two executor-driven phases around linking and resolution
//! - [`PlanEmitter`]: persistence boundary ([`JsonPlanEmitter`])
//!
//! # Example
//!
//! ```rust,ignore
//! use scopewire_core::{Generator, GeneratorConfig, JsonPlanEmitter};
//!
//! let config = GeneratorConfig::new("src").with_destination("plan.json");
//! let generator = Generator::new(config.clone());
//! let report = generator
//!     .generate(&JsonPlanEmitter::new(config.destination))
//!     .await?;
//! println!("{report}");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod discovery;
mod emit;
mod error;
mod pipeline;
mod source;

pub use config::GeneratorConfig;
pub use discovery::SourceDiscovery;
pub use emit::{JsonPlanEmitter, PlanEmitter};
pub use error::{ConfigError, GeneratorError, Phase, WriteError};
pub use pipeline::{GenerationReport, Generator};
pub use source::{DeclarationParser, ManifestParser, ParseError, SourceUnit};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
