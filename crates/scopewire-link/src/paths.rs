//! Path enumeration
//!
//! Depth-first walk from every root, children in declaration order, emitting
//! one record per distinct root-to-scope walk. A scope instantiated from N
//! parents therefore shows up in (at least) N records.
//!
//! Companion scopes are visited right after their owner, before the owner's
//! children, so primary and companion records interleave at each owner.

use crate::graph::ScopeGraph;
use scopewire_model::{ScopeId, ScopePath};
use std::fmt::{self, Display, Formatter};

/// Sequential identifier of a path record, stable across identical runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(pub usize);

impl Display for PathId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Which tree a path ends in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathFamily {
    /// Path ends at a primary scope
    Primary,

    /// Path ends at a companion scope
    Companion,
}

/// One enumerated path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRecord {
    pub id: PathId,
    pub path: ScopePath,
    pub family: PathFamily,
}

impl PathRecord {
    /// The scope this path resolves
    #[inline]
    #[must_use]
    pub fn target(&self) -> ScopeId {
        self.path.target()
    }
}

/// Enumerates every path of a frozen graph
#[derive(Debug, Clone, Copy)]
pub struct PathEnumerator<'g> {
    graph: &'g ScopeGraph,
}

impl<'g> PathEnumerator<'g> {
    /// Create enumerator over a graph
    #[inline]
    #[must_use]
    pub fn new(graph: &'g ScopeGraph) -> Self {
        Self { graph }
    }

    /// All paths, roots in declaration order, depth-first
    #[must_use]
    pub fn enumerate(&self) -> Vec<PathRecord> {
        let mut records = Vec::new();
        for root in self.graph.roots() {
            self.visit(ScopePath::root(*root), &mut records);
        }
        tracing::debug!(
            "Enumerated {} paths over {} scopes",
            records.len(),
            self.graph.len()
        );
        records
    }

    /// Paths ending at the named scope
    #[must_use]
    pub fn paths_to(&self, name: &str) -> Vec<PathRecord> {
        let Some(scope) = self.graph.lookup(name) else {
            return Vec::new();
        };
        self.enumerate()
            .into_iter()
            .filter(|record| record.target() == scope.id)
            .collect()
    }

    fn visit(&self, path: ScopePath, records: &mut Vec<PathRecord>) {
        let scope = self.graph.scope(path.target());
        let family = if scope.is_companion() {
            PathFamily::Companion
        } else {
            PathFamily::Primary
        };

        records.push(PathRecord {
            id: PathId(records.len()),
            path: path.clone(),
            family,
        });

        if let Some(plugin) = &scope.plugin {
            self.visit(path.child(plugin.companion), records);
        }
        for child in &scope.children {
            self.visit(path.child(*child), records);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Linker;
    use pretty_assertions::assert_eq;
    use scopewire_model::{Contract, Declarations, ScopeDecl};

    fn render(graph: &ScopeGraph, records: &[PathRecord]) -> Vec<String> {
        records.iter().map(|r| graph.path_string(&r.path)).collect()
    }

    #[test]
    fn diamond_yields_two_paths() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_child("A").with_child("B"))
            .with_scope(ScopeDecl::new("A").with_child("Leaf"))
            .with_scope(ScopeDecl::new("B").with_child("Leaf"))
            .with_scope(ScopeDecl::new("Leaf"));
        let graph = Linker::new(decls).link().unwrap();

        let records = PathEnumerator::new(&graph).enumerate();
        assert_eq!(
            render(&graph, &records),
            vec!["Root", "Root->A", "Root->A->Leaf", "Root->B", "Root->B->Leaf"]
        );
        assert_eq!(PathEnumerator::new(&graph).paths_to("Leaf").len(), 2);
    }

    #[test]
    fn ids_are_sequential() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("Root").with_child("A"))
            .with_scope(ScopeDecl::new("A"));
        let graph = Linker::new(decls).link().unwrap();

        let ids: Vec<_> = PathEnumerator::new(&graph)
            .enumerate()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![PathId(0), PathId(1)]);
    }

    #[test]
    fn companion_interleaves_after_owner() {
        let decls = Declarations::new()
            .with_scope(
                ScopeDecl::root("Root")
                    .with_child("Child")
                    .with_plugin("RootNonCore", "RootExtension"),
            )
            .with_scope(ScopeDecl::new("Child"))
            .with_companion(ScopeDecl::new("RootNonCore"))
            .with_extension(Contract::new("RootExtension", vec![]).unwrap());
        let graph = Linker::new(decls).link().unwrap();

        let records = PathEnumerator::new(&graph).enumerate();
        assert_eq!(
            render(&graph, &records),
            vec!["Root", "Root->RootNonCore", "Root->Child"]
        );
        assert_eq!(records[1].family, PathFamily::Companion);
        assert_eq!(records[2].family, PathFamily::Primary);
    }

    #[test]
    fn multiple_roots_each_walked() {
        let decls = Declarations::new()
            .with_scope(ScopeDecl::root("R1").with_child("Shared"))
            .with_scope(ScopeDecl::root("R2").with_child("Shared"))
            .with_scope(ScopeDecl::new("Shared"));
        let graph = Linker::new(decls).link().unwrap();

        let records = PathEnumerator::new(&graph).enumerate();
        assert_eq!(
            render(&graph, &records),
            vec!["R1", "R1->Shared", "R2", "R2->Shared"]
        );
    }

    #[test]
    fn unknown_scope_has_no_paths() {
        let decls = Declarations::new().with_scope(ScopeDecl::root("Root"));
        let graph = Linker::new(decls).link().unwrap();
        assert!(PathEnumerator::new(&graph).paths_to("Nope").is_empty());
    }
}
