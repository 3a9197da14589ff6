// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mode x tier preference lists.

use std::collections::BTreeMap;
use std::str::FromStr;

use modelgate_core::{ComplexityTier, ModelgateError};

use crate::registry::ModelRegistry;

/// Built-in routing table with `eco`, `standard`, and `premium` modes.
pub const BUILTIN_TABLE: &str = include_str!("../data/routing.json");

/// Operating mode -> complexity tier -> ordered model ids, most preferred first.
///
/// Every cell present in the table is non-empty. Cells that are absent are
/// reported as configuration errors at lookup time.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    modes: BTreeMap<String, BTreeMap<ComplexityTier, Vec<String>>>,
}

impl RoutingTable {
    /// Build a table from explicit cells, rejecting empty preference lists.
    pub fn new(
        modes: BTreeMap<String, BTreeMap<ComplexityTier, Vec<String>>>,
    ) -> Result<Self, ModelgateError> {
        for (mode, tiers) in &modes {
            for (tier, ids) in tiers {
                if ids.is_empty() {
                    return Err(ModelgateError::Config(format!(
                        "routing table cell ({mode}, {tier}) is empty"
                    )));
                }
            }
        }
        Ok(Self { modes })
    }

    /// Parse table JSON: `{"<mode>": {"simple": [...], "standard": [...], "complex": [...]}}`.
    pub fn from_json(json: &str) -> Result<Self, ModelgateError> {
        let raw: BTreeMap<String, BTreeMap<String, Vec<String>>> = serde_json::from_str(json)
            .map_err(|e| ModelgateError::Config(format!("malformed routing table: {e}")))?;

        let mut modes = BTreeMap::new();
        for (mode, cells) in raw {
            let mut tiers = BTreeMap::new();
            for (tier_name, ids) in cells {
                let tier = ComplexityTier::from_str(&tier_name).map_err(|_| {
                    ModelgateError::Config(format!(
                        "routing table mode `{mode}` has unknown tier `{tier_name}`"
                    ))
                })?;
                tiers.insert(tier, ids);
            }
            modes.insert(mode, tiers);
        }
        Self::new(modes)
    }

    pub fn builtin() -> Result<Self, ModelgateError> {
        Self::from_json(BUILTIN_TABLE)
    }

    /// Preference list for one cell.
    pub fn preferences(&self, mode: &str, tier: ComplexityTier) -> Result<&[String], ModelgateError> {
        self.modes
            .get(mode)
            .and_then(|tiers| tiers.get(&tier))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                ModelgateError::Config(format!("routing table has no entry for ({mode}, {tier})"))
            })
    }

    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    pub fn has_mode(&self, mode: &str) -> bool {
        self.modes.contains_key(mode)
    }

    /// Reject ids the catalog does not know.
    pub fn validate_against(&self, registry: &ModelRegistry) -> Result<(), ModelgateError> {
        for (mode, tiers) in &self.modes {
            for (tier, ids) in tiers {
                if let Some(id) = ids.iter().find(|id| !registry.contains(id)) {
                    return Err(ModelgateError::Config(format!(
                        "routing table cell ({mode}, {tier}) references unknown model `{id}`"
                    )));
                }
            }
        }
        Ok(())
    }
}
