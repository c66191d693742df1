//! Content-based provider deduplication
//!
//! Two providers are content-identical when they share a contract and every
//! required value comes from the same scope through the same accessor. The
//! hop count is path-specific and is kept per member rather than in the key,
//! so one shared provider can serve a scope reached at different depths.

use crate::resolver::{Accessor, Provider};
use indexmap::IndexMap;
use scopewire_link::ScopeGraph;
use scopewire_model::{Contract, ScopeId, Value};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Number of hex characters of the content hash kept in identifiers
const ID_HASH_LEN: usize = 8;

/// Identifier of a shared provider, unique within one run
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProviderId(pub String);

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grouping key of content-identical providers
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentKey {
    pub contract: String,
    pub sources: Vec<(Value, ScopeId, Accessor)>,
}

impl ContentKey {
    /// Key of a resolved provider
    #[must_use]
    pub fn of(provider: &Provider) -> Self {
        Self {
            contract: provider.contract.name().to_string(),
            sources: provider
                .resolution
                .values()
                .map(|source| (source.value.clone(), source.scope, source.accessor))
                .collect(),
        }
    }

    /// Stable hex digest, independent of arena ids
    #[must_use]
    pub fn digest(&self, graph: &ScopeGraph) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.contract.as_bytes());
        for (value, scope, accessor) in &self.sources {
            hasher.update(b"\0");
            hasher.update(value.name.as_bytes());
            hasher.update(b":");
            hasher.update(value.type_name.as_bytes());
            hasher.update(b"@");
            hasher.update(graph.name(*scope).as_bytes());
            if let Accessor::Extension { companion } = accessor {
                hasher.update(b"+");
                hasher.update(graph.name(*companion).as_bytes());
            }
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

/// Content-identical providers sharing one implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderGroup {
    pub id: ProviderId,
    pub key: ContentKey,
    pub contract: Arc<Contract>,

    /// Members in path order; never empty
    pub members: Vec<Provider>,
}

impl ProviderGroup {
    /// First member, used as the group's representative resolution
    #[inline]
    #[must_use]
    pub fn representative(&self) -> &Provider {
        &self.members[0]
    }
}

/// Group providers by content, groups ordered by first appearance
///
/// All trivially satisfied providers of the same contract land in one group.
#[must_use]
pub fn group_providers(graph: &ScopeGraph, providers: Vec<Provider>) -> Vec<ProviderGroup> {
    let total = providers.len();
    let mut grouped: IndexMap<ContentKey, Vec<Provider>> = IndexMap::new();
    for provider in providers {
        grouped
            .entry(ContentKey::of(&provider))
            .or_default()
            .push(provider);
    }

    let mut taken = HashSet::new();
    let groups: Vec<ProviderGroup> = grouped
        .into_iter()
        .map(|(key, members)| {
            let contract = Arc::clone(&members[0].contract);
            let id = unique_id(&mut taken, base_id(graph, &key, &contract));
            ProviderGroup {
                id,
                key,
                contract,
                members,
            }
        })
        .collect();

    tracing::info!("Grouped {} providers into {} shared providers", total, groups.len());
    groups
}

fn base_id(graph: &ScopeGraph, key: &ContentKey, contract: &Contract) -> String {
    if contract.requires_nothing() {
        return format!("{}Provider", contract.name());
    }
    let digest = key.digest(graph);
    format!("{}{}Provider", contract.name(), &digest[..ID_HASH_LEN])
}

/// `base`, or `base` with the first free counter appended
pub(crate) fn unique_id(taken: &mut HashSet<String>, base: String) -> ProviderId {
    if taken.insert(base.clone()) {
        return ProviderId(base);
    }
    let mut counter = 2usize;
    loop {
        let candidate = format!("{base}{counter}");
        if taken.insert(candidate.clone()) {
            return ProviderId(candidate);
        }
        counter += 1;
    }
}
