//! Resolution errors
//!
//! Both variants are fatal: a partially wired graph is never emitted.

/// Errors raised while resolving providers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No ancestor on the path supplies a required value
    #[error("no ancestor of '{path}' supplies '{value}: {type_name}'")]
    UnsatisfiedValue {
        path: String,
        value: String,
        type_name: String,
    },

    /// Owner supplies, companion requires and extension exposes the same values
    #[error(
        "cyclic extension between '{owner}' and companion '{companion}': {}",
        values.join(", ")
    )]
    CyclicExtension {
        owner: String,
        companion: String,
        values: Vec<String>,
    },
}
