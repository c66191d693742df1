//! Per-run provider registry
//!
//! Maps every rendered path to the shared provider serving it, and every
//! owning path to its extension provider. The generated factory consults this
//! table when a scope is instantiated along a given path.

use crate::dedup::ProviderId;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderRegistry {
    providers: IndexMap<String, ProviderId>,
    extensions: IndexMap<String, ProviderId>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the provider of a path, returning any previous entry
    pub fn register(&mut self, path: impl Into<String>, id: ProviderId) -> Option<ProviderId> {
        self.providers.insert(path.into(), id)
    }

    /// Register the extension provider of an owning path
    pub fn register_extension(
        &mut self,
        path: impl Into<String>,
        id: ProviderId,
    ) -> Option<ProviderId> {
        self.extensions.insert(path.into(), id)
    }

    #[inline]
    #[must_use]
    pub fn provider_for(&self, path: &str) -> Option<&ProviderId> {
        self.providers.get(path)
    }

    #[inline]
    #[must_use]
    pub fn extension_for(&self, path: &str) -> Option<&ProviderId> {
        self.extensions.get(path)
    }

    /// Registered paths with their provider, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProviderId)> + '_ {
        self.providers.iter().map(|(path, id)| (path.as_str(), id))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = ProviderRegistry::new();
        let id = ProviderId("GameDependencyabcdef12Provider".to_string());

        assert!(registry.register("Root->Game", id.clone()).is_none());
        assert_eq!(registry.provider_for("Root->Game"), Some(&id));
        assert_eq!(registry.provider_for("Root"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reregistration_returns_previous() {
        let mut registry = ProviderRegistry::new();
        registry.register("Root", ProviderId("A".into()));
        let previous = registry.register("Root", ProviderId("B".into()));

        assert_eq!(previous, Some(ProviderId("A".into())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn extensions_kept_apart() {
        let mut registry = ProviderRegistry::new();
        registry.register_extension("Root->Checkout", ProviderId("X".into()));

        assert!(registry.is_empty());
        assert!(registry.extension_for("Root->Checkout").is_some());
    }
}
