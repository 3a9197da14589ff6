// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing engine: resolves a classification plus override to one model.

use std::sync::Arc;

use modelgate_core::{ComplexityTier, ModelgateError, OverrideKind};
use tracing::{debug, info, warn};

use crate::classifier::ClassificationResult;
use crate::overrides::OverrideResult;
use crate::registry::{ModelRegistry, ModelSpec};
use crate::table::RoutingTable;

/// The routing decision for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    /// The model the request is sent to.
    pub model: ModelSpec,
    /// Tier reported by the classifier.
    pub tier: ComplexityTier,
    pub mode: String,
    /// Which override applied, `None` when the routing table decided.
    pub override_kind: OverrideKind,
    /// Human-readable explanation, including any fallback taken.
    pub justification: String,
    /// True when no preferred model was available and the engine fell back
    /// to the cheapest configured model.
    pub fell_back: bool,
}

/// Resolve one request to a concrete model.
///
/// A forced override is looked up directly and never consults the table.
/// Otherwise the `(mode, tier)` preference list is tried in order, falling
/// back to the cheapest configured model across the whole catalog.
pub fn route(
    classification: &ClassificationResult,
    mode: &str,
    override_result: &OverrideResult,
    registry: &ModelRegistry,
    table: &RoutingTable,
) -> Result<RoutingDecision, ModelgateError> {
    let tier = classification.tier;

    if let Some(forced) = override_result.forced_model() {
        let model = registry.get(forced)?.clone();
        let justification = format!(
            "override {}: forced model {} (classifier said {tier}, composite {:.3})",
            override_result.kind, model.id, classification.composite
        );
        debug!(model = %model.id, kind = %override_result.kind, "forced route");
        return Ok(RoutingDecision {
            model,
            tier,
            mode: mode.to_string(),
            override_kind: override_result.kind,
            justification,
            fell_back: false,
        });
    }

    let preferences = table.preferences(mode, tier)?;
    if let Some(model) = registry.resolve_preference(preferences) {
        let rank = preferences.iter().position(|id| *id == model.id).unwrap_or(0) + 1;
        let justification = format!(
            "{mode}/{tier} (composite {:.3}): preference #{rank} {}",
            classification.composite, model.id
        );
        debug!(model = %model.id, %tier, mode, rank, "table route");
        return Ok(RoutingDecision {
            model: model.clone(),
            tier,
            mode: mode.to_string(),
            override_kind: OverrideKind::None,
            justification,
            fell_back: false,
        });
    }

    let Some(model) = registry.cheapest_available().into_iter().next() else {
        warn!(mode, %tier, "no providers configured");
        return Err(ModelgateError::NoProvidersConfigured);
    };
    info!(
        model = %model.id,
        provider = %model.provider,
        mode,
        %tier,
        "no preferred provider configured, falling back to cheapest available"
    );
    let justification = format!(
        "{mode}/{tier} (composite {:.3}): none of [{}] has a configured provider, \
         fell back to cheapest available {}",
        classification.composite,
        preferences.join(", "),
        model.id
    );
    Ok(RoutingDecision {
        model: model.clone(),
        tier,
        mode: mode.to_string(),
        override_kind: OverrideKind::None,
        justification,
        fell_back: true,
    })
}

/// Shared handle over the read-only registry and table.
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<ModelRegistry>,
    table: Arc<RoutingTable>,
}

impl Router {
    /// Pair a registry and table, rejecting table ids absent from the catalog.
    pub fn new(registry: Arc<ModelRegistry>, table: Arc<RoutingTable>) -> Result<Self, ModelgateError> {
        table.validate_against(&registry)?;
        Ok(Self { registry, table })
    }

    pub fn route(
        &self,
        classification: &ClassificationResult,
        mode: &str,
        override_result: &OverrideResult,
    ) -> Result<RoutingDecision, ModelgateError> {
        route(classification, mode, override_result, &self.registry, &self.table)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }
}
