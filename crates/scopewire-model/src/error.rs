//! Error types for the node model

/// Errors raised while constructing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A contract lists the same value name twice
    #[error("contract '{contract}' declares value '{value}' more than once")]
    DuplicateValue { contract: String, value: String },

    /// A declaration has an empty name
    #[error("{kind} declared with an empty name")]
    EmptyName { kind: &'static str },
}
