//! Provider synthesis
//!
//! Produces the structured form consumed by plan emitters. Nothing here knows
//! about target-language syntax; descriptions only say which scope supplies
//! which value, through which accessor, at what distance per path.

use crate::dedup::{group_providers, unique_id, ProviderGroup, ProviderId};
use crate::error::ResolveError;
use crate::plugin::PluginValidator;
use crate::registry::ProviderRegistry;
use crate::resolver::{Accessor, Resolver};
use indexmap::IndexMap;
use scopewire_link::{PathEnumerator, PathRecord, ScopeGraph};
use scopewire_model::{ScopeKind, Value};
use serde::Serialize;
use std::collections::HashSet;

/// Accessor as seen by an emitter, by scope name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessorDescription {
    Direct,
    Extension { owner: String, companion: String },
}

/// One required value of a shared provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueBinding {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub source: String,
    pub accessor: AccessorDescription,
}

/// One path served by a shared provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub path: String,

    /// Value name → hops from the target to its source on this path
    pub distances: IndexMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescription {
    pub id: ProviderId,
    pub contract: String,
    pub values: Vec<ValueBinding>,
    pub registrations: Vec<Registration>,
}

/// Accessor object exposing a companion's values through an owner path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionProviderDescription {
    pub id: ProviderId,
    pub owner: String,
    pub owner_path: String,
    pub companion: String,
    pub extension: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeRole {
    Primary,
    Companion,
}

/// Per-scope data an emitter needs besides providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeMetadata {
    pub name: String,
    pub role: ScopeRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub contract: String,
    pub supplies: Vec<Value>,
    pub paths: Vec<String>,
}

/// Everything handed to a plan emitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationPlan {
    pub scopes: Vec<ScopeMetadata>,
    pub providers: Vec<ProviderDescription>,
    pub extensions: Vec<ExtensionProviderDescription>,
    pub registry: ProviderRegistry,
}

impl GenerationPlan {
    /// Run validation, resolution, grouping and synthesis on one thread
    pub fn build(graph: &ScopeGraph) -> Result<Self, ResolveError> {
        let validator = PluginValidator::new(graph);
        validator.check_cycles()?;

        let records = PathEnumerator::new(graph).enumerate();
        validator.check_backing(&records)?;

        let providers = Resolver::new(graph).resolve_all(&records)?;
        let synthesizer = ProviderSynthesizer::new(graph);
        let descriptions = group_providers(graph, providers)
            .iter()
            .map(|group| synthesizer.describe(group))
            .collect();

        Ok(Self::assemble(graph, &records, descriptions))
    }

    /// Combine synthesized descriptions with scope metadata and the registry
    #[must_use]
    pub fn assemble(
        graph: &ScopeGraph,
        records: &[PathRecord],
        providers: Vec<ProviderDescription>,
    ) -> Self {
        let synthesizer = ProviderSynthesizer::new(graph);
        let mut taken: HashSet<String> = providers.iter().map(|p| p.id.0.clone()).collect();
        let extensions = synthesizer.extensions_avoiding(records, &mut taken);

        let mut registry = ProviderRegistry::new();
        for description in &providers {
            for registration in &description.registrations {
                registry.register(registration.path.clone(), description.id.clone());
            }
        }
        for extension in &extensions {
            registry.register_extension(extension.owner_path.clone(), extension.id.clone());
        }

        Self {
            scopes: synthesizer.scope_metadata(records),
            providers,
            extensions,
            registry,
        }
    }
}

/// Turns provider groups into descriptions
#[derive(Debug, Clone, Copy)]
pub struct ProviderSynthesizer<'g> {
    graph: &'g ScopeGraph,
}

impl<'g> ProviderSynthesizer<'g> {
    #[inline]
    #[must_use]
    pub fn new(graph: &'g ScopeGraph) -> Self {
        Self { graph }
    }

    /// Description of one shared provider
    #[must_use]
    pub fn describe(&self, group: &ProviderGroup) -> ProviderDescription {
        let values = group
            .representative()
            .resolution
            .values()
            .map(|source| ValueBinding {
                name: source.value.name.clone(),
                type_name: source.value.type_name.clone(),
                source: self.graph.name(source.scope).to_string(),
                accessor: match source.accessor {
                    Accessor::Direct => AccessorDescription::Direct,
                    Accessor::Extension { companion } => AccessorDescription::Extension {
                        owner: self.graph.name(source.scope).to_string(),
                        companion: self.graph.name(companion).to_string(),
                    },
                },
            })
            .collect();

        let registrations = group
            .members
            .iter()
            .map(|member| Registration {
                path: self.graph.path_string(&member.path),
                distances: member
                    .resolution
                    .iter()
                    .map(|(name, source)| (name.clone(), source.distance))
                    .collect(),
            })
            .collect();

        tracing::debug!("Synthesized {} ({} paths)", group.id, group.members.len());
        ProviderDescription {
            id: group.id.clone(),
            contract: group.contract.name().to_string(),
            values,
            registrations,
        }
    }

    /// One extension provider per path ending at an owning scope
    #[must_use]
    pub fn describe_extensions(&self, records: &[PathRecord]) -> Vec<ExtensionProviderDescription> {
        self.extensions_avoiding(records, &mut HashSet::new())
    }

    /// Extension providers whose ids avoid, and then join, `taken`
    fn extensions_avoiding(
        &self,
        records: &[PathRecord],
        taken: &mut HashSet<String>,
    ) -> Vec<ExtensionProviderDescription> {
        records
            .iter()
            .filter_map(|record| {
                let owner = self.graph.scope(record.target());
                let plugin = owner.plugin.as_ref()?;
                let owner_path = self.graph.path_string(&record.path);
                let digest = blake3::hash(owner_path.as_bytes());
                let suffix = &hex::encode(digest.as_bytes())[..8];

                Some(ExtensionProviderDescription {
                    id: unique_id(
                        taken,
                        format!("{}{}Provider", plugin.extension.name(), suffix),
                    ),
                    owner: owner.name.clone(),
                    owner_path,
                    companion: self.graph.name(plugin.companion).to_string(),
                    extension: plugin.extension.name().to_string(),
                    values: plugin.extension.values().to_vec(),
                })
            })
            .collect()
    }

    /// Metadata for every scope, in arena order, with its rendered paths
    #[must_use]
    pub fn scope_metadata(&self, records: &[PathRecord]) -> Vec<ScopeMetadata> {
        let mut paths: Vec<Vec<String>> = vec![Vec::new(); self.graph.len()];
        for record in records {
            paths[record.target().index()].push(self.graph.path_string(&record.path));
        }

        self.graph
            .scopes()
            .iter()
            .zip(paths)
            .map(|(scope, paths)| ScopeMetadata {
                name: scope.name.clone(),
                role: match scope.kind {
                    ScopeKind::Primary => ScopeRole::Primary,
                    ScopeKind::Companion { .. } => ScopeRole::Companion,
                },
                owner: scope.owner().map(|id| self.graph.name(id).to_string()),
                contract: scope.contract.name().to_string(),
                supplies: scope.supplied.clone(),
                paths,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scopewire_link::Linker;
    use scopewire_test_utils::{game_scenario, plugin_scenario};

    #[test]
    fn game_plan_registers_every_path() {
        let graph = Linker::new(game_scenario()).link().unwrap();
        let plan = GenerationPlan::build(&graph).unwrap();

        assert_eq!(plan.registry.len(), 5);
        let a = plan.registry.provider_for("Root->LoggedIn->ScoreSheet").unwrap();
        let b = plan
            .registry
            .provider_for("Root->LoggedIn->Game->ScoreSheet")
            .unwrap();
        assert_eq!(a, b);
        assert!(plan.extensions.is_empty());
    }

    #[test]
    fn game_bindings() {
        let graph = Linker::new(game_scenario()).link().unwrap();
        let plan = GenerationPlan::build(&graph).unwrap();

        let game = plan
            .providers
            .iter()
            .find(|p| p.contract == "GameDependency")
            .unwrap();
        let sources: Vec<_> = game
            .values
            .iter()
            .map(|v| (v.name.as_str(), v.source.as_str()))
            .collect();
        assert_eq!(
            sources,
            vec![("scoreStream", "LoggedIn"), ("playersStream", "Root")]
        );
        assert_eq!(game.registrations[0].distances["scoreStream"], 1);
        assert_eq!(game.registrations[0].distances["playersStream"], 2);
    }

    #[test]
    fn plugin_plan_uses_extension_accessor() {
        let graph = Linker::new(plugin_scenario()).link().unwrap();
        let plan = GenerationPlan::build(&graph).unwrap();

        let payment = plan
            .providers
            .iter()
            .find(|p| p.contract == "PaymentDependency")
            .unwrap();
        assert_eq!(
            payment.values[0].accessor,
            AccessorDescription::Extension {
                owner: "Checkout".to_string(),
                companion: "CheckoutNonCore".to_string(),
            }
        );
        assert_eq!(payment.values[1].accessor, AccessorDescription::Direct);
        assert_eq!(payment.registrations[0].distances["session"], 2);

        assert_eq!(plan.extensions.len(), 1);
        assert_eq!(plan.extensions[0].owner_path, "Root->Checkout");
        assert!(plan.registry.extension_for("Root->Checkout").is_some());
    }

    #[test]
    fn extension_ids_never_reuse_provider_ids() {
        let graph = Linker::new(plugin_scenario()).link().unwrap();
        let records = PathEnumerator::new(&graph).enumerate();
        let base = ProviderSynthesizer::new(&graph).describe_extensions(&records)[0]
            .id
            .clone();

        let clashing = ProviderDescription {
            id: base.clone(),
            contract: "Other".to_string(),
            values: Vec::new(),
            registrations: Vec::new(),
        };
        let plan = GenerationPlan::assemble(&graph, &records, vec![clashing]);

        assert_eq!(plan.extensions[0].id, ProviderId(format!("{base}2")));
        assert_eq!(
            plan.registry.extension_for("Root->Checkout"),
            Some(&ProviderId(format!("{base}2")))
        );
    }

    #[test]
    fn plan_serializes_for_emitters() {
        let graph = Linker::new(plugin_scenario()).link().unwrap();
        let plan = GenerationPlan::build(&graph).unwrap();
        let json = serde_json::to_value(&plan).unwrap();

        let payment = json["providers"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["contract"] == "PaymentDependency")
            .unwrap();
        assert_eq!(payment["values"][0]["type"], "Cart");
        assert_eq!(
            payment["values"][0]["accessor"],
            serde_json::json!({
                "kind": "extension",
                "owner": "Checkout",
                "companion": "CheckoutNonCore",
            })
        );
        assert_eq!(payment["values"][1]["accessor"]["kind"], "direct");

        let companion = json["scopes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["name"] == "CheckoutNonCore")
            .unwrap();
        assert_eq!(companion["role"], "companion");
        assert_eq!(companion["owner"], "Checkout");
        assert!(json["registry"]["extensions"]["Root->Checkout"].is_string());
    }

    #[test]
    fn companion_metadata_names_owner() {
        let graph = Linker::new(plugin_scenario()).link().unwrap();
        let plan = GenerationPlan::build(&graph).unwrap();

        let companion = plan
            .scopes
            .iter()
            .find(|s| s.name == "CheckoutNonCore")
            .unwrap();
        assert_eq!(companion.role, ScopeRole::Companion);
        assert_eq!(companion.owner.as_deref(), Some("Checkout"));
        assert_eq!(companion.paths, vec!["Root->Checkout->CheckoutNonCore"]);
    }
}
