//! Owner / companion / extension validation
//!
//! Two checks run before any provider is resolved:
//!
//! 1. **Cycles**: a value the owner supplies, the companion requires and the
//!    extension exposes would have the companion consume, through its owner,
//!    what it produces for that same owner.
//! 2. **Backing**: every value an extension exposes must be supplied by the
//!    companion, otherwise descendants would read through an empty accessor.

use crate::error::ResolveError;
use scopewire_link::{PathFamily, PathRecord, ScopeGraph};

/// Validates every plugin pairing of a frozen graph
#[derive(Debug, Clone, Copy)]
pub struct PluginValidator<'g> {
    graph: &'g ScopeGraph,
}

impl<'g> PluginValidator<'g> {
    #[inline]
    #[must_use]
    pub fn new(graph: &'g ScopeGraph) -> Self {
        Self { graph }
    }

    /// Reject owner/companion pairs whose values loop through the extension
    pub fn check_cycles(&self) -> Result<(), ResolveError> {
        for (owner, companion) in self.graph.plugin_pairs() {
            let Some(plugin) = &owner.plugin else {
                continue;
            };

            let values: Vec<String> = companion
                .contract
                .values()
                .iter()
                .filter(|value| owner.supplies(value) && plugin.extension.contains(value))
                .map(|value| value.name.clone())
                .collect();

            if !values.is_empty() {
                tracing::warn!(
                    "Cyclic extension between {} and {}: {:?}",
                    owner.name,
                    companion.name,
                    values
                );
                return Err(ResolveError::CyclicExtension {
                    owner: owner.name.clone(),
                    companion: companion.name.clone(),
                    values,
                });
            }
        }
        Ok(())
    }

    /// Ensure each extension value is supplied by the companion
    ///
    /// Failures are reported on the first companion path in `records`.
    pub fn check_backing(&self, records: &[PathRecord]) -> Result<(), ResolveError> {
        for record in records.iter().filter(|r| r.family == PathFamily::Companion) {
            let companion = self.graph.scope(record.target());
            let Some(owner) = companion.owner().map(|id| self.graph.scope(id)) else {
                continue;
            };
            let Some(plugin) = &owner.plugin else {
                continue;
            };

            if let Some(missing) = plugin
                .extension
                .values()
                .iter()
                .find(|value| !companion.supplies(value))
            {
                return Err(ResolveError::UnsatisfiedValue {
                    path: self.graph.path_string(&record.path),
                    value: missing.name.clone(),
                    type_name: missing.type_name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scopewire_link::{Linker, PathEnumerator};
    use scopewire_model::{Declarations, ScopeDecl};
    use scopewire_test_utils::{contract, cyclic_plugin_scenario, plugin_scenario};

    #[test]
    fn cyclic_pair_rejected() {
        let graph = Linker::new(cyclic_plugin_scenario()).link().unwrap();
        let err = PluginValidator::new(&graph).check_cycles().unwrap_err();
        assert_eq!(
            err,
            ResolveError::CyclicExtension {
                owner: "Vault".to_string(),
                companion: "VaultNonCore".to_string(),
                values: vec!["token".to_string()],
            }
        );
    }

    #[test]
    fn acyclic_pair_accepted() {
        let graph = Linker::new(plugin_scenario()).link().unwrap();
        let validator = PluginValidator::new(&graph);
        let records = PathEnumerator::new(&graph).enumerate();

        assert!(validator.check_cycles().is_ok());
        assert!(validator.check_backing(&records).is_ok());
    }

    #[test]
    fn unbacked_extension_value_rejected() {
        let decls = Declarations::new()
            .with_scope(
                ScopeDecl::root("Root")
                    .with_child("Shop")
                    .with_plugin("ShopNonCore", "ShopExtension"),
            )
            .with_scope(ScopeDecl::new("Shop"))
            .with_companion(ScopeDecl::new("ShopNonCore"))
            .with_extension(contract("ShopExtension", &[("cart", "Cart")]));
        let graph = Linker::new(decls).link().unwrap();
        let records = PathEnumerator::new(&graph).enumerate();

        let err = PluginValidator::new(&graph)
            .check_backing(&records)
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnsatisfiedValue {
                path: "Root->ShopNonCore".to_string(),
                value: "cart".to_string(),
                type_name: "Cart".to_string(),
            }
        );
    }
}
