//! Frozen scope graph
//!
//! Produced once by [`Linker::link`](crate::Linker::link); read-only from
//! then on and safe to share behind an `Arc` across worker threads.

use scopewire_model::{Scope, ScopeId, ScopePath};
use std::collections::HashMap;

/// Separator used in rendered path strings
const PATH_SEPARATOR: &str = "->";

/// Arena of linked scopes
#[derive(Debug, Clone)]
pub struct ScopeGraph {
    scopes: Vec<Scope>,
    by_name: HashMap<String, ScopeId>,
    roots: Vec<ScopeId>,
}

impl ScopeGraph {
    pub(crate) fn new(scopes: Vec<Scope>) -> Self {
        let by_name = scopes.iter().map(|s| (s.name.clone(), s.id)).collect();
        let roots = scopes.iter().filter(|s| s.is_root).map(|s| s.id).collect();
        Self {
            scopes,
            by_name,
            roots,
        }
    }

    /// Get a scope by id
    ///
    /// Ids are only minted by the linker for this arena, so lookups by ids
    /// obtained from the same graph always succeed.
    #[inline]
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Get a scope by id, `None` if it belongs to another graph
    #[inline]
    #[must_use]
    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    /// Find a scope by name
    #[inline]
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Scope> {
        self.by_name.get(name).map(|id| self.scope(*id))
    }

    /// Root scopes in declaration order
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[ScopeId] {
        &self.roots
    }

    /// All scopes in arena order (primary scopes first, then companions)
    #[inline]
    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Number of scopes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Check if graph is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Name of a scope
    #[inline]
    #[must_use]
    pub fn name(&self, id: ScopeId) -> &str {
        &self.scope(id).name
    }

    /// Render a path as `Root->LoggedIn->Game`
    #[must_use]
    pub fn path_string(&self, path: &ScopePath) -> String {
        path.ids()
            .iter()
            .map(|id| self.name(*id))
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    /// Pluginized scopes with their companion
    pub fn plugin_pairs(&self) -> impl Iterator<Item = (&Scope, &Scope)> + '_ {
        self.scopes.iter().filter_map(|owner| {
            owner
                .plugin
                .as_ref()
                .map(|plugin| (owner, self.scope(plugin.companion)))
        })
    }
}
