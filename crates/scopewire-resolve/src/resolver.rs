//! Nearest-ancestor value resolution
//!
//! For each required value of a path's target, the ancestors are searched
//! outward from the immediate parent. A scope that directly supplies the value
//! always wins over an extension contract, however far away it is; extension
//! contracts of owning ancestors are only consulted by a second outward pass
//! once the direct walk reached the root without a match.

use crate::error::ResolveError;
use indexmap::IndexMap;
use scopewire_link::{PathId, PathRecord, ScopeGraph};
use scopewire_model::{Contract, ScopeId, ScopePath, Value};
use serde::Serialize;
use std::sync::Arc;

/// How a resolved value is reached from its source scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Accessor {
    /// The source scope supplies the value itself
    Direct,

    /// The source scope exposes the value through its extension contract,
    /// backed by `companion`
    Extension { companion: ScopeId },
}

/// Where one required value comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueSource {
    pub value: Value,
    pub scope: ScopeId,
    pub distance: usize,
    pub accessor: Accessor,
}

/// Resolution of one path's contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub path_id: PathId,
    pub path: ScopePath,
    pub contract: Arc<Contract>,

    /// Value name → source, in contract order
    pub resolution: IndexMap<String, ValueSource>,
}

impl Provider {
    /// Scope this provider serves
    #[inline]
    #[must_use]
    pub fn target(&self) -> ScopeId {
        self.path.target()
    }

    /// Whether the contract has nothing to resolve
    #[inline]
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.contract.requires_nothing()
    }

    /// Source of a required value
    #[inline]
    #[must_use]
    pub fn source(&self, value: &str) -> Option<&ValueSource> {
        self.resolution.get(value)
    }
}

/// Resolves path records against a frozen graph
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'g> {
    graph: &'g ScopeGraph,
}

impl<'g> Resolver<'g> {
    #[inline]
    #[must_use]
    pub fn new(graph: &'g ScopeGraph) -> Self {
        Self { graph }
    }

    /// Resolve every required value of the record's target
    pub fn resolve(&self, record: &PathRecord) -> Result<Provider, ResolveError> {
        let target = self.graph.scope(record.target());
        let contract = Arc::clone(&target.contract);

        let mut resolution = IndexMap::with_capacity(contract.values().len());
        for value in contract.values() {
            let source =
                self.find_source(&record.path, value)
                    .ok_or_else(|| ResolveError::UnsatisfiedValue {
                        path: self.graph.path_string(&record.path),
                        value: value.name.clone(),
                        type_name: value.type_name.clone(),
                    })?;
            resolution.insert(value.name.clone(), source);
        }

        Ok(Provider {
            path_id: record.id,
            path: record.path.clone(),
            contract,
            resolution,
        })
    }

    /// Resolve records in order, stopping at the first failure
    pub fn resolve_all(&self, records: &[PathRecord]) -> Result<Vec<Provider>, ResolveError> {
        let providers = records
            .iter()
            .map(|record| self.resolve(record))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Resolved {} providers", providers.len());
        Ok(providers)
    }

    fn find_source(&self, path: &ScopePath, value: &Value) -> Option<ValueSource> {
        let direct = path.ancestors().find_map(|(distance, id)| {
            self.graph
                .scope(id)
                .supplies(value)
                .then(|| ValueSource {
                    value: value.clone(),
                    scope: id,
                    distance,
                    accessor: Accessor::Direct,
                })
        });
        if direct.is_some() {
            return direct;
        }

        // A companion reading its owner's extension would be reading itself.
        let own_owner = self.graph.scope(path.target()).owner();
        path.ancestors()
            .filter(|(_, id)| Some(*id) != own_owner)
            .find_map(|(distance, id)| {
                let plugin = self.graph.scope(id).plugin.as_ref()?;
                plugin.extension.contains(value).then(|| ValueSource {
                    value: value.clone(),
                    scope: id,
                    distance,
                    accessor: Accessor::Extension {
                        companion: plugin.companion,
                    },
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scopewire_link::{Linker, PathEnumerator};
    use scopewire_model::{Declarations, ScopeDecl};
    use scopewire_test_utils::contract;

    fn resolve_target(decls: Declarations, target: &str) -> Vec<Result<Provider, ResolveError>> {
        let graph = Linker::new(decls).link().unwrap();
        let resolver = Resolver::new(&graph);
        PathEnumerator::new(&graph)
            .paths_to(target)
            .iter()
            .map(|record| resolver.resolve(record))
            .collect()
    }

    #[test]
    fn nearest_supplier_wins() {
        let decls = Declarations::new()
            .with_contract(contract("LeafDependency", &[("db", "Db")]))
            .with_scope(
                ScopeDecl::root("Root")
                    .supplying("db", "Db")
                    .with_child("Mid"),
            )
            .with_scope(ScopeDecl::new("Mid").supplying("db", "Db").with_child("Leaf"))
            .with_scope(ScopeDecl::new("Leaf").with_contract("LeafDependency"));

        let providers = resolve_target(decls, "Leaf");
        let provider = providers[0].as_ref().unwrap();
        let source = provider.source("db").unwrap();
        assert_eq!(source.distance, 1);
        assert_eq!(source.accessor, Accessor::Direct);
    }

    #[test]
    fn type_mismatch_is_not_a_match() {
        let decls = Declarations::new()
            .with_contract(contract("LeafDependency", &[("db", "Db")]))
            .with_scope(
                ScopeDecl::root("Root")
                    .supplying("db", "OtherDb")
                    .with_child("Leaf"),
            )
            .with_scope(ScopeDecl::new("Leaf").with_contract("LeafDependency"));

        let providers = resolve_target(decls, "Leaf");
        assert_eq!(
            providers[0],
            Err(ResolveError::UnsatisfiedValue {
                path: "Root->Leaf".to_string(),
                value: "db".to_string(),
                type_name: "Db".to_string(),
            })
        );
    }

    #[test]
    fn target_never_supplies_itself() {
        let decls = Declarations::new()
            .with_contract(contract("RootDependency", &[("db", "Db")]))
            .with_scope(
                ScopeDecl::root("Root")
                    .with_contract("RootDependency")
                    .supplying("db", "Db"),
            );

        let providers = resolve_target(decls, "Root");
        assert!(matches!(
            providers[0],
            Err(ResolveError::UnsatisfiedValue { .. })
        ));
    }

    #[test]
    fn empty_contract_resolves_trivially() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_child("Leaf"))
            .with_scope(ScopeDecl::new("Leaf"));

        let providers = resolve_target(decls, "Leaf");
        let provider = providers[0].as_ref().unwrap();
        assert!(provider.is_trivial());
        assert!(provider.resolution.is_empty());
    }

    #[test]
    fn resolution_keeps_contract_order() {
        let decls = Declarations::new()
            .with_contract(contract("LeafDependency", &[("b", "B"), ("a", "A")]))
            .with_scope(
                ScopeDecl::root("Root")
                    .supplying("a", "A")
                    .supplying("b", "B")
                    .with_child("Leaf"),
            )
            .with_scope(ScopeDecl::new("Leaf").with_contract("LeafDependency"));

        let providers = resolve_target(decls, "Leaf");
        let keys: Vec<_> = providers[0]
            .as_ref()
            .unwrap()
            .resolution
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
    }
}
