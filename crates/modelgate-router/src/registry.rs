// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable model catalog plus provider availability.

use std::collections::{HashMap, HashSet};

use modelgate_config::model::ProvidersConfig;
use modelgate_core::{ModelgateError, Provider};
use serde::{Deserialize, Serialize};

/// Built-in catalog, used when no catalog file is configured.
pub const BUILTIN_CATALOG: &str = include_str!("../data/models.json");

/// A model the router can select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    /// Vendor-specific model id, sent upstream verbatim.
    pub id: String,
    pub display_name: String,
    pub provider: Provider,
    /// USD per million input tokens.
    pub input_cost_per_mtok: f64,
    /// USD per million output tokens.
    pub output_cost_per_mtok: f64,
    pub max_context_tokens: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    models: Vec<ModelSpec>,
}

/// Providers with a usable credential, or a base URL for local providers.
pub fn configured_providers(providers: &ProvidersConfig) -> HashSet<Provider> {
    Provider::ALL
        .into_iter()
        .filter(|&p| {
            let entry = providers.get(p);
            if p.is_local() {
                entry.endpoint().is_some()
            } else {
                entry.credential().is_some()
            }
        })
        .collect()
}

/// In-memory catalog keyed by model id. Read-only after construction.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
    index: HashMap<String, usize>,
    configured: HashSet<Provider>,
}

impl ModelRegistry {
    /// Build a registry, rejecting duplicate ids and negative or non-finite costs.
    pub fn new(
        models: Vec<ModelSpec>,
        configured: impl IntoIterator<Item = Provider>,
    ) -> Result<Self, ModelgateError> {
        let mut index = HashMap::with_capacity(models.len());
        for (i, spec) in models.iter().enumerate() {
            if spec.id.trim().is_empty() {
                return Err(ModelgateError::Config(format!(
                    "catalog entry {i} has an empty model id"
                )));
            }
            for (what, cost) in [
                ("input", spec.input_cost_per_mtok),
                ("output", spec.output_cost_per_mtok),
            ] {
                if !cost.is_finite() || cost < 0.0 {
                    return Err(ModelgateError::Config(format!(
                        "model `{}` has invalid {what} cost {cost}",
                        spec.id
                    )));
                }
            }
            if index.insert(spec.id.clone(), i).is_some() {
                return Err(ModelgateError::Config(format!(
                    "duplicate model id `{}` in catalog",
                    spec.id
                )));
            }
        }

        Ok(Self {
            models,
            index,
            configured: configured.into_iter().collect(),
        })
    }

    /// Parse catalog JSON (`{"models": [...]}`).
    pub fn from_json(json: &str, providers: &ProvidersConfig) -> Result<Self, ModelgateError> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| ModelgateError::Config(format!("malformed model catalog: {e}")))?;
        Self::new(file.models, configured_providers(providers))
    }

    pub fn builtin(providers: &ProvidersConfig) -> Result<Self, ModelgateError> {
        Self::from_json(BUILTIN_CATALOG, providers)
    }

    /// Look up a model by id.
    pub fn get(&self, id: &str) -> Result<&ModelSpec, ModelgateError> {
        self.index
            .get(id)
            .map(|&i| &self.models[i])
            .ok_or_else(|| ModelgateError::UnknownModel { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All models, in catalog order.
    pub fn all(&self) -> &[ModelSpec] {
        &self.models
    }

    /// Lowest input cost across the whole catalog, configured or not.
    pub fn cheapest(&self) -> Option<&ModelSpec> {
        self.models
            .iter()
            .min_by(|a, b| a.input_cost_per_mtok.total_cmp(&b.input_cost_per_mtok))
    }

    /// Highest output cost across the whole catalog.
    pub fn most_expensive(&self) -> Option<&ModelSpec> {
        self.models
            .iter()
            .max_by(|a, b| a.output_cost_per_mtok.total_cmp(&b.output_cost_per_mtok))
    }

    pub fn is_provider_configured(&self, provider: Provider) -> bool {
        self.configured.contains(&provider)
    }

    pub fn has_configured_provider(&self) -> bool {
        !self.configured.is_empty()
    }

    /// First model in `ids` whose provider is configured.
    ///
    /// Ids unknown to the catalog are skipped.
    pub fn resolve_preference<S: AsRef<str>>(&self, ids: &[S]) -> Option<&ModelSpec> {
        ids.iter()
            .filter_map(|id| self.get(id.as_ref()).ok())
            .find(|spec| self.is_provider_configured(spec.provider))
    }

    /// Models with a configured provider, cheapest input cost first.
    ///
    /// Ties keep catalog order.
    pub fn cheapest_available(&self) -> Vec<&ModelSpec> {
        let mut available: Vec<&ModelSpec> = self
            .models
            .iter()
            .filter(|spec| self.is_provider_configured(spec.provider))
            .collect();
        available.sort_by(|a, b| a.input_cost_per_mtok.total_cmp(&b.input_cost_per_mtok));
        available
    }
}
