//! Linking errors
//!
//! Every variant is fatal: the run aborts and nothing is emitted.

/// Errors raised while linking declarations into a scope graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkingError {
    /// Two scopes (primary or companion) share a name
    #[error("scope '{name}' is declared more than once")]
    DuplicateScope { name: String },

    /// Two contracts share a name
    #[error("contract '{name}' is declared more than once")]
    DuplicateContract { name: String },

    /// A child reference names an unknown scope
    #[error("scope '{owner}' instantiates unknown scope '{target}'")]
    MissingChild { owner: String, target: String },

    /// A declared contract does not exist
    #[error("scope '{owner}' declares unknown contract '{target}'")]
    MissingContract { owner: String, target: String },

    /// A declared companion scope does not exist
    #[error("scope '{owner}' declares unknown companion scope '{target}'")]
    MissingCompanion { owner: String, target: String },

    /// A declared extension contract does not exist
    #[error("scope '{owner}' declares unknown extension contract '{target}'")]
    MissingExtension { owner: String, target: String },

    /// A companion is claimed by more than one owner
    #[error("companion scope '{companion}' is claimed by both '{first}' and '{second}'")]
    CompanionAlreadyOwned {
        companion: String,
        first: String,
        second: String,
    },

    /// A companion declaration is malformed
    #[error("companion scope '{name}' is invalid: {reason}")]
    InvalidCompanion { name: String, reason: String },

    /// A non-root scope is never instantiated
    #[error("scope '{scope}' is not a root and no scope instantiates it")]
    Unreachable { scope: String },

    /// Scopes instantiate each other
    #[error("instantiation cycle: {}", cycle.join(" -> "))]
    InstantiationCycle { cycle: Vec<String> },
}

impl LinkingError {
    /// Name of the declaration the error is reported against
    #[must_use]
    pub fn owner(&self) -> &str {
        match self {
            Self::DuplicateScope { name }
            | Self::DuplicateContract { name }
            | Self::InvalidCompanion { name, .. } => name,
            Self::MissingChild { owner, .. }
            | Self::MissingContract { owner, .. }
            | Self::MissingCompanion { owner, .. }
            | Self::MissingExtension { owner, .. } => owner,
            Self::CompanionAlreadyOwned { second, .. } => second,
            Self::Unreachable { scope } => scope,
            Self::InstantiationCycle { cycle } => cycle.first().map_or("", String::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_child_names_owner_and_target() {
        let err = LinkingError::MissingChild {
            owner: "LoggedIn".to_string(),
            target: "Gmae".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("LoggedIn"));
        assert!(msg.contains("Gmae"));
        assert_eq!(err.owner(), "LoggedIn");
    }

    #[test]
    fn cycle_message() {
        let err = LinkingError::InstantiationCycle {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "instantiation cycle: A -> B -> A");
    }
}
