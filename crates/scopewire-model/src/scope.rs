//! Scope declarations and resolved scopes
//!
//! Two stages of the same concept:
//! - [`ScopeDecl`]: what the parser found, with references still textual
//! - [`Scope`]: a linked node owned by a frozen scope graph, with references
//!   replaced by [`ScopeId`] arena indices

use crate::contract::Contract;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Plugin declaration attached to an owning scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDecl {
    /// Type name of the companion scope
    pub companion: String,

    /// Type name of the extension contract
    pub extension: String,
}

/// A scope as declared in source, before linking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDecl {
    /// Scope type name
    pub name: String,

    /// Declared contract name, `None` for the empty contract
    #[serde(default)]
    pub contract: Option<String>,

    /// Whether the scope is a root (no parent)
    #[serde(default)]
    pub root: bool,

    /// Values this scope supplies to its descendants
    #[serde(default)]
    pub supplies: Vec<Value>,

    /// Type names of the scopes this scope instantiates, in source order
    #[serde(default)]
    pub children: Vec<String>,

    /// Companion/extension pair for pluginized scopes
    #[serde(default)]
    pub plugin: Option<PluginDecl>,
}

impl ScopeDecl {
    /// Create new non-root declaration with the empty contract
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contract: None,
            root: false,
            supplies: Vec::new(),
            children: Vec::new(),
            plugin: None,
        }
    }

    /// Create new root declaration
    #[inline]
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            root: true,
            ..Self::new(name)
        }
    }

    /// With declared contract name
    #[inline]
    #[must_use]
    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    /// With one more supplied value
    #[inline]
    #[must_use]
    pub fn supplying(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.supplies.push(Value::new(name, type_name));
        self
    }

    /// With one more child reference
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: impl Into<String>) -> Self {
        self.children.push(child.into());
        self
    }

    /// With companion scope and extension contract
    #[inline]
    #[must_use]
    pub fn with_plugin(mut self, companion: impl Into<String>, extension: impl Into<String>) -> Self {
        self.plugin = Some(PluginDecl {
            companion: companion.into(),
            extension: extension.into(),
        });
        self
    }
}

/// Everything declared by one source unit, or merged across a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarations {
    /// Primary scopes
    #[serde(default)]
    pub scopes: Vec<ScopeDecl>,

    /// Dependency contracts
    #[serde(default)]
    pub contracts: Vec<Contract>,

    /// Companion scopes of pluginized owners
    #[serde(default)]
    pub companions: Vec<ScopeDecl>,

    /// Extension contracts of pluginized owners
    #[serde(default)]
    pub extensions: Vec<Contract>,
}

impl Declarations {
    /// Create empty declaration set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing relevant was declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
            && self.contracts.is_empty()
            && self.companions.is_empty()
            && self.extensions.is_empty()
    }

    /// Total number of declarations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len() + self.contracts.len() + self.companions.len() + self.extensions.len()
    }

    /// Append everything from `other`, preserving order
    pub fn merge(&mut self, other: Declarations) {
        self.scopes.extend(other.scopes);
        self.contracts.extend(other.contracts);
        self.companions.extend(other.companions);
        self.extensions.extend(other.extensions);
    }

    /// With one more scope
    #[inline]
    #[must_use]
    pub fn with_scope(mut self, scope: ScopeDecl) -> Self {
        self.scopes.push(scope);
        self
    }

    /// With one more contract
    #[inline]
    #[must_use]
    pub fn with_contract(mut self, contract: Contract) -> Self {
        self.contracts.push(contract);
        self
    }

    /// With one more companion scope
    #[inline]
    #[must_use]
    pub fn with_companion(mut self, companion: ScopeDecl) -> Self {
        self.companions.push(companion);
        self
    }

    /// With one more extension contract
    #[inline]
    #[must_use]
    pub fn with_extension(mut self, extension: Contract) -> Self {
        self.extensions.push(extension);
        self
    }
}

/// Arena index of a linked scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// Index into the owning arena
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for ScopeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which tree a scope belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    /// Regular scope in the primary tree
    Primary,

    /// Companion scope, attached 1:1 to its owner
    Companion { owner: ScopeId },
}

/// Resolved plugin pairing of an owning scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLink {
    /// The companion scope
    pub companion: ScopeId,

    /// The extension contract exposed to descendants
    pub extension: Arc<Contract>,
}

/// A linked scope
///
/// Only ever handed out by shared reference from a frozen graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    pub kind: ScopeKind,
    pub is_root: bool,
    pub supplied: Vec<Value>,
    pub parents: Vec<ScopeId>,
    pub children: Vec<ScopeId>,
    pub contract: Arc<Contract>,
    pub plugin: Option<PluginLink>,
}

impl Scope {
    /// Check whether this scope supplies exactly `value`
    #[inline]
    #[must_use]
    pub fn supplies(&self, value: &Value) -> bool {
        self.supplied.iter().any(|v| v.matches(value))
    }

    /// Owner of a companion scope
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<ScopeId> {
        match self.kind {
            ScopeKind::Companion { owner } => Some(owner),
            ScopeKind::Primary => None,
        }
    }

    /// Whether this is a companion scope
    #[inline]
    #[must_use]
    pub fn is_companion(&self) -> bool {
        matches!(self.kind, ScopeKind::Companion { .. })
    }
}

/// One concrete walk from a root to the scope under resolution
///
/// Never empty; the last element is the target scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopePath(Vec<ScopeId>);

impl ScopePath {
    /// Path consisting of a root only
    #[inline]
    #[must_use]
    pub fn root(root: ScopeId) -> Self {
        Self(vec![root])
    }

    /// Build a path from ids, `None` if empty
    #[inline]
    #[must_use]
    pub fn from_ids(ids: Vec<ScopeId>) -> Option<Self> {
        if ids.is_empty() {
            None
        } else {
            Some(Self(ids))
        }
    }

    /// Extend the path by one child
    #[must_use]
    pub fn child(&self, child: ScopeId) -> Self {
        let mut ids = Vec::with_capacity(self.0.len() + 1);
        ids.extend_from_slice(&self.0);
        ids.push(child);
        Self(ids)
    }

    /// The scope under resolution
    #[inline]
    #[must_use]
    pub fn target(&self) -> ScopeId {
        self.0[self.0.len() - 1]
    }

    /// The root the walk started from
    #[inline]
    #[must_use]
    pub fn root_id(&self) -> ScopeId {
        self.0[0]
    }

    /// Ids from root to target
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[ScopeId] {
        &self.0
    }

    /// Number of scopes on the path, at least one
    #[inline]
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Ancestors of the target, nearest first, with their 1-based distance
    pub fn ancestors(&self) -> impl Iterator<Item = (usize, ScopeId)> + '_ {
        self.0
            .iter()
            .rev()
            .skip(1)
            .enumerate()
            .map(|(hops, id)| (hops + 1, *id))
    }
}
