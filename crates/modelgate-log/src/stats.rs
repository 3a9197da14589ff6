// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation over the routing log. Read-only.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use modelgate_core::{ComplexityTier, ModelgateError, Provider, RoutingLogEntry, RoutingLogStore};
use modelgate_router::ModelSpec;
use serde::Serialize;

use crate::pricing::estimate_cost;

/// Spend and distribution over one window of the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutingStats {
    pub total_requests: u64,
    /// Sum of the estimated cost recorded on each entry.
    pub actual_cost_usd: f64,
    /// Model every request is re-priced against, if one was given.
    pub baseline_model: Option<String>,
    /// What the same tokens would have cost on the baseline model.
    pub baseline_cost_usd: f64,
    /// `baseline - actual`. Negative when routing cost more than the baseline.
    pub savings_usd: f64,
    /// Savings as a share of the baseline, clamped to `[0, 100]`.
    pub savings_pct: f64,
    pub avg_latency_ms: f64,
    pub per_model: BTreeMap<String, u64>,
    pub per_tier: BTreeMap<ComplexityTier, u64>,
    pub per_provider: BTreeMap<Provider, u64>,
}

/// Aggregate a slice of entries.
///
/// An empty slice yields all-zero totals. With no baseline, or a free
/// baseline, the savings percentage is zero.
pub fn compute_stats(entries: &[RoutingLogEntry], baseline: Option<&ModelSpec>) -> RoutingStats {
    let mut stats = RoutingStats {
        baseline_model: baseline.map(|b| b.id.clone()),
        ..RoutingStats::default()
    };
    let mut latency_total = 0u128;

    for entry in entries {
        stats.total_requests += 1;
        stats.actual_cost_usd += entry.estimated_cost_usd;
        if let Some(spec) = baseline {
            stats.baseline_cost_usd += estimate_cost(spec, entry.input_tokens, entry.output_tokens);
        }
        latency_total += u128::from(entry.latency_ms);
        *stats.per_model.entry(entry.model_id.clone()).or_default() += 1;
        *stats.per_tier.entry(entry.tier).or_default() += 1;
        *stats.per_provider.entry(entry.provider).or_default() += 1;
    }

    if stats.total_requests > 0 {
        stats.avg_latency_ms = latency_total as f64 / stats.total_requests as f64;
    }
    stats.savings_usd = stats.baseline_cost_usd - stats.actual_cost_usd;
    stats.savings_pct = savings_pct(stats.baseline_cost_usd, stats.actual_cost_usd);
    stats
}

fn savings_pct(baseline: f64, actual: f64) -> f64 {
    if baseline.is_nan() || baseline <= 0.0 || !actual.is_finite() {
        return 0.0;
    }
    ((baseline - actual) / baseline * 100.0).clamp(0.0, 100.0)
}

/// Load entries at or after `since` and aggregate them.
pub async fn stats_since(
    store: &dyn RoutingLogStore,
    since: DateTime<Utc>,
    baseline: Option<&ModelSpec>,
) -> Result<RoutingStats, ModelgateError> {
    let entries = store.entries_since(since).await?;
    Ok(compute_stats(&entries, baseline))
}
