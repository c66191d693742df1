//! Tree linker
//!
//! Turns a run's declarations into a [`ScopeGraph`]. All cross references
//! are resolved as lookups into a name-keyed arena; parents, children,
//! contracts and plugin pairs are attached to mutable arena nodes, then the
//! whole arena is frozen. The mutable stage never leaves this module.

use crate::error::LinkingError;
use crate::graph::ScopeGraph;
use scopewire_model::{
    Contract, Declarations, PluginLink, Scope, ScopeDecl, ScopeId, ScopeKind,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Links declarations into a frozen scope graph
///
/// Usage:
/// ```rust,ignore
/// let graph = Linker::new(declarations).link()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Linker {
    declarations: Declarations,
}

impl Linker {
    /// Create linker over a run's declarations
    #[inline]
    #[must_use]
    pub fn new(declarations: Declarations) -> Self {
        Self { declarations }
    }

    /// Link everything and freeze the result
    ///
    /// # Errors
    /// Returns the first `LinkingError` found, in declaration order:
    /// duplicates, unknown contracts, unknown children, unknown companions or
    /// extensions, unreachable scopes, instantiation cycles.
    pub fn link(self) -> Result<ScopeGraph, LinkingError> {
        let Declarations {
            scopes,
            contracts,
            companions,
            extensions,
        } = self.declarations;

        let contracts = index_contracts(contracts)?;
        let extensions = index_contracts(extensions)?;

        let mut arena = Arena::new(scopes, companions)?;
        arena.link_contracts(&contracts)?;
        arena.link_children()?;
        arena.link_plugins(&extensions)?;
        arena.check_reachability()?;
        arena.check_acyclic()?;

        let graph = arena.freeze();
        tracing::info!(
            "Linked {} scopes ({} roots, {} plugin pairs)",
            graph.len(),
            graph.roots().len(),
            graph.plugin_pairs().count()
        );
        Ok(graph)
    }
}

fn index_contracts(
    contracts: Vec<Contract>,
) -> Result<HashMap<String, Arc<Contract>>, LinkingError> {
    let mut index = HashMap::with_capacity(contracts.len());
    for contract in contracts {
        let name = contract.name().to_string();
        if index.contains_key(&name) {
            return Err(LinkingError::DuplicateContract { name });
        }
        index.insert(name, Arc::new(contract));
    }
    Ok(index)
}

/// Mutable arena node used only while linking
#[derive(Debug)]
struct LinkNode {
    decl: ScopeDecl,
    is_companion: bool,
    owner: Option<ScopeId>,
    parents: Vec<ScopeId>,
    children: Vec<ScopeId>,
    contract: Option<Arc<Contract>>,
    plugin: Option<PluginLink>,
}

impl LinkNode {
    fn new(decl: ScopeDecl, is_companion: bool) -> Self {
        Self {
            decl,
            is_companion,
            owner: None,
            parents: Vec::new(),
            children: Vec::new(),
            contract: None,
            plugin: None,
        }
    }

    fn name(&self) -> &str {
        &self.decl.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

#[derive(Debug)]
struct Arena {
    nodes: Vec<LinkNode>,
    primary: HashMap<String, ScopeId>,
    companions: HashMap<String, ScopeId>,
    empty: Arc<Contract>,
}

impl Arena {
    fn new(scopes: Vec<ScopeDecl>, companions: Vec<ScopeDecl>) -> Result<Self, LinkingError> {
        let mut nodes = Vec::with_capacity(scopes.len() + companions.len());
        let mut primary = HashMap::with_capacity(scopes.len());
        let mut companion_index = HashMap::with_capacity(companions.len());

        for decl in scopes {
            if primary.contains_key(&decl.name) {
                return Err(LinkingError::DuplicateScope { name: decl.name });
            }
            primary.insert(decl.name.clone(), next_id(&nodes));
            nodes.push(LinkNode::new(decl, false));
        }

        for decl in companions {
            if primary.contains_key(&decl.name) || companion_index.contains_key(&decl.name) {
                return Err(LinkingError::DuplicateScope { name: decl.name });
            }
            if decl.root {
                return Err(LinkingError::InvalidCompanion {
                    name: decl.name,
                    reason: "a companion scope cannot be a root".to_string(),
                });
            }
            if decl.plugin.is_some() {
                return Err(LinkingError::InvalidCompanion {
                    name: decl.name,
                    reason: "a companion scope cannot declare its own companion".to_string(),
                });
            }
            companion_index.insert(decl.name.clone(), next_id(&nodes));
            nodes.push(LinkNode::new(decl, true));
        }

        Ok(Self {
            nodes,
            primary,
            companions: companion_index,
            empty: Arc::new(Contract::empty()),
        })
    }

    fn link_contracts(
        &mut self,
        contracts: &HashMap<String, Arc<Contract>>,
    ) -> Result<(), LinkingError> {
        for node in &mut self.nodes {
            let contract = match &node.decl.contract {
                None => Arc::clone(&self.empty),
                Some(name) => contracts.get(name).cloned().ok_or_else(|| {
                    LinkingError::MissingContract {
                        owner: node.decl.name.clone(),
                        target: name.clone(),
                    }
                })?,
            };
            node.contract = Some(contract);
        }
        Ok(())
    }

    fn link_children(&mut self) -> Result<(), LinkingError> {
        let mut edges = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let parent = id_at(index);
            let mut seen = HashSet::with_capacity(node.decl.children.len());
            for target in &node.decl.children {
                let child = self.primary.get(target).copied().ok_or_else(|| {
                    LinkingError::MissingChild {
                        owner: node.decl.name.clone(),
                        target: target.clone(),
                    }
                })?;
                if seen.insert(child) {
                    edges.push((parent, child));
                }
            }
        }

        for (parent, child) in edges {
            self.nodes[parent.index()].children.push(child);
            self.nodes[child.index()].parents.push(parent);
        }
        Ok(())
    }

    fn link_plugins(
        &mut self,
        extensions: &HashMap<String, Arc<Contract>>,
    ) -> Result<(), LinkingError> {
        let mut claims = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let Some(plugin) = &node.decl.plugin else {
                continue;
            };
            let companion = self.companions.get(&plugin.companion).copied().ok_or_else(|| {
                LinkingError::MissingCompanion {
                    owner: node.decl.name.clone(),
                    target: plugin.companion.clone(),
                }
            })?;
            let extension = extensions.get(&plugin.extension).cloned().ok_or_else(|| {
                LinkingError::MissingExtension {
                    owner: node.decl.name.clone(),
                    target: plugin.extension.clone(),
                }
            })?;
            claims.push((id_at(index), companion, extension));
        }

        for (owner, companion, extension) in claims {
            if let Some(first) = self.nodes[companion.index()].owner {
                return Err(LinkingError::CompanionAlreadyOwned {
                    companion: self.nodes[companion.index()].name().to_string(),
                    first: self.nodes[first.index()].name().to_string(),
                    second: self.nodes[owner.index()].name().to_string(),
                });
            }

            tracing::debug!(
                "Paired '{}' with companion '{}' via '{}'",
                self.nodes[owner.index()].name(),
                self.nodes[companion.index()].name(),
                extension.name()
            );

            let node = &mut self.nodes[companion.index()];
            node.owner = Some(owner);
            node.parents.push(owner);
            self.nodes[owner.index()].plugin = Some(PluginLink {
                companion,
                extension,
            });
        }
        Ok(())
    }

    fn check_reachability(&self) -> Result<(), LinkingError> {
        for node in &self.nodes {
            if node.decl.root {
                continue;
            }
            let linked = if node.is_companion {
                node.owner.is_some()
            } else {
                !node.parents.is_empty()
            };
            if !linked {
                return Err(LinkingError::Unreachable {
                    scope: node.decl.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), LinkingError> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut stack = Vec::new();

        for index in 0..self.nodes.len() {
            if marks[index] == Mark::Unvisited {
                self.visit(id_at(index), &mut marks, &mut stack)?;
            }
        }
        Ok(())
    }

    fn visit(
        &self,
        id: ScopeId,
        marks: &mut [Mark],
        stack: &mut Vec<ScopeId>,
    ) -> Result<(), LinkingError> {
        marks[id.index()] = Mark::Visiting;
        stack.push(id);

        for next in self.successors(id) {
            match marks[next.index()] {
                Mark::Visiting => {
                    let start = stack.iter().position(|s| *s == next).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start..]
                        .iter()
                        .map(|s| self.nodes[s.index()].name().to_string())
                        .collect();
                    cycle.push(self.nodes[next.index()].name().to_string());
                    return Err(LinkingError::InstantiationCycle { cycle });
                }
                Mark::Unvisited => self.visit(next, marks, stack)?,
                Mark::Done => {}
            }
        }

        stack.pop();
        marks[id.index()] = Mark::Done;
        Ok(())
    }

    fn successors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        let node = &self.nodes[id.index()];
        node.children
            .iter()
            .copied()
            .chain(node.plugin.as_ref().map(|p| p.companion))
    }

    fn freeze(self) -> ScopeGraph {
        let empty = self.empty;
        let scopes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| Scope {
                id: id_at(index),
                kind: node
                    .owner
                    .map_or(ScopeKind::Primary, |owner| ScopeKind::Companion { owner }),
                is_root: node.decl.root,
                supplied: node.decl.supplies,
                parents: node.parents,
                children: node.children,
                contract: node.contract.unwrap_or_else(|| Arc::clone(&empty)),
                plugin: node.plugin,
                name: node.decl.name,
            })
            .collect();
        ScopeGraph::new(scopes)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn id_at(index: usize) -> ScopeId {
    ScopeId(index as u32)
}

fn next_id(nodes: &[LinkNode]) -> ScopeId {
    id_at(nodes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopewire_model::Value;

    fn contract(name: &str, values: &[(&str, &str)]) -> Contract {
        Contract::new(
            name,
            values.iter().map(|(n, t)| Value::new(*n, *t)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn links_parents_and_children() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_child("A").with_child("B"))
            .with_scope(ScopeDecl::new("A").with_child("B"))
            .with_scope(ScopeDecl::new("B"));

        let graph = Linker::new(decls).link().unwrap();
        let b = graph.lookup("B").unwrap();
        let parents: Vec<_> = b.parents.iter().map(|p| graph.name(*p)).collect();

        assert_eq!(parents, vec!["Root", "A"]);
        assert_eq!(graph.lookup("Root").unwrap().children.len(), 2);
    }

    #[test]
    fn repeated_reference_collapses() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_child("A").with_child("A"))
            .with_scope(ScopeDecl::new("A"));

        let graph = Linker::new(decls).link().unwrap();
        assert_eq!(graph.lookup("Root").unwrap().children.len(), 1);
        assert_eq!(graph.lookup("A").unwrap().parents.len(), 1);
    }

    #[test]
    fn missing_child_is_fatal() {
        let decls = Declarations::new().with_scope(ScopeDecl::root("Root").with_child("Nope"));

        assert_eq!(
            Linker::new(decls).link().unwrap_err(),
            LinkingError::MissingChild {
                owner: "Root".to_string(),
                target: "Nope".to_string(),
            }
        );
    }

    #[test]
    fn missing_contract_is_fatal() {
        let decls =
            Declarations::new().with_scope(ScopeDecl::root("Root").with_contract("RootDependency"));

        assert!(matches!(
            Linker::new(decls).link(),
            Err(LinkingError::MissingContract { .. })
        ));
    }

    #[test]
    fn undeclared_contract_gets_empty_sentinel() {
        let decls = Declarations::new().with_scope(ScopeDecl::root("Root"));
        let graph = Linker::new(decls).link().unwrap();
        assert!(graph.lookup("Root").unwrap().contract.is_empty());
    }

    #[test]
    fn declared_contract_is_shared() {
        let decls = Declarations::new()
            .with_contract(contract("Shared", &[("a", "A")]))
            .with_scope(ScopeDecl::root("Root").with_child("X").with_child("Y"))
            .with_scope(ScopeDecl::new("X").with_contract("Shared"))
            .with_scope(ScopeDecl::new("Y").with_contract("Shared"));

        let graph = Linker::new(decls).link().unwrap();
        let x = &graph.lookup("X").unwrap().contract;
        let y = &graph.lookup("Y").unwrap().contract;
        assert!(Arc::ptr_eq(x, y));
    }

    #[test]
    fn duplicate_scope_rejected() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root"))
            .with_scope(ScopeDecl::root("Root"));

        assert_eq!(
            Linker::new(decls).link().unwrap_err(),
            LinkingError::DuplicateScope {
                name: "Root".to_string()
            }
        );
    }

    #[test]
    fn duplicate_contract_rejected() {
        let decls = Declarations::new()
            .with_contract(contract("D", &[]))
            .with_contract(contract("D", &[]));

        assert!(matches!(
            Linker::new(decls).link(),
            Err(LinkingError::DuplicateContract { .. })
        ));
    }

    #[test]
    fn orphan_scope_is_unreachable() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root"))
            .with_scope(ScopeDecl::new("Orphan"));

        assert_eq!(
            Linker::new(decls).link().unwrap_err(),
            LinkingError::Unreachable {
                scope: "Orphan".to_string()
            }
        );
    }

    #[test]
    fn instantiation_cycle_detected() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_child("A"))
            .with_scope(ScopeDecl::new("A").with_child("B"))
            .with_scope(ScopeDecl::new("B").with_child("A"));

        assert_eq!(
            Linker::new(decls).link().unwrap_err(),
            LinkingError::InstantiationCycle {
                cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
            }
        );
    }

    #[test]
    fn companion_and_extension_linked() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_plugin("RootNonCore", "RootExtension"))
            .with_companion(ScopeDecl::new("RootNonCore").supplying("cart", "Cart"))
            .with_extension(contract("RootExtension", &[("cart", "Cart")]));

        let graph = Linker::new(decls).link().unwrap();
        let root = graph.lookup("Root").unwrap();
        let plugin = root.plugin.as_ref().unwrap();
        let companion = graph.scope(plugin.companion);

        assert_eq!(companion.name, "RootNonCore");
        assert_eq!(companion.owner(), Some(root.id));
        assert_eq!(companion.parents, vec![root.id]);
        assert_eq!(plugin.extension.name(), "RootExtension");
    }

    #[test]
    fn missing_companion_named() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_plugin("Ghost", "RootExtension"))
            .with_extension(contract("RootExtension", &[]));

        assert_eq!(
            Linker::new(decls).link().unwrap_err(),
            LinkingError::MissingCompanion {
                owner: "Root".to_string(),
                target: "Ghost".to_string(),
            }
        );
    }

    #[test]
    fn missing_extension_named() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_plugin("RootNonCore", "Ghost"))
            .with_companion(ScopeDecl::new("RootNonCore"));

        assert_eq!(
            Linker::new(decls).link().unwrap_err(),
            LinkingError::MissingExtension {
                owner: "Root".to_string(),
                target: "Ghost".to_string(),
            }
        );
    }

    #[test]
    fn companion_claimed_twice() {
        let decls = Declarations::new()
            .with_scope(
                ScopeDecl::root("Root")
                    .with_child("Other")
                    .with_plugin("NonCore", "Ext"),
            )
            .with_scope(ScopeDecl::new("Other").with_plugin("NonCore", "Ext"))
            .with_companion(ScopeDecl::new("NonCore"))
            .with_extension(contract("Ext", &[]));

        assert!(matches!(
            Linker::new(decls).link(),
            Err(LinkingError::CompanionAlreadyOwned { .. })
        ));
    }

    #[test]
    fn unowned_companion_is_unreachable() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root"))
            .with_companion(ScopeDecl::new("Lonely"));

        assert!(matches!(
            Linker::new(decls).link(),
            Err(LinkingError::Unreachable { .. })
        ));
    }

    #[test]
    fn root_companion_rejected() {
        let decls = Declarations::new().with_companion(ScopeDecl::root("NonCore"));
        assert!(matches!(
            Linker::new(decls).link(),
            Err(LinkingError::InvalidCompanion { .. })
        ));
    }
}
