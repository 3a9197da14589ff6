// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `modelgate stats`: spend and savings over the routing log.

use chrono::{DateTime, Duration, Utc};
use modelgate_config::ModelgateConfig;
use modelgate_core::ModelgateError;
use modelgate_log::{stats_since, RoutingStats};

use crate::bootstrap::{baseline_model, load_router, open_store, LogBackend};

/// Human-readable report of aggregated stats.
pub fn render_stats(stats: &RoutingStats, window_hours: u64) -> String {
    let mut out = format!("routing log, last {window_hours}h\n");
    out.push_str(&format!("requests:      {}\n", stats.total_requests));
    out.push_str(&format!("actual spend:  ${:.4}\n", stats.actual_cost_usd));
    if let Some(baseline) = &stats.baseline_model {
        out.push_str(&format!(
            "baseline:      ${:.4} (all on {baseline})\n",
            stats.baseline_cost_usd
        ));
        out.push_str(&format!(
            "savings:       ${:.4} ({:.1}%)\n",
            stats.savings_usd, stats.savings_pct
        ));
    }
    out.push_str(&format!("avg latency:   {:.0} ms\n", stats.avg_latency_ms));
    if !stats.per_tier.is_empty() {
        out.push_str("by tier:\n");
        for (tier, count) in &stats.per_tier {
            out.push_str(&format!("  {tier:<10} {count}\n"));
        }
    }
    if !stats.per_model.is_empty() {
        out.push_str("by model:\n");
        for (model, count) in &stats.per_model {
            out.push_str(&format!("  {model:<36} {count}\n"));
        }
    }
    out
}

/// Runs the `modelgate stats` command.
pub async fn run_stats(config: ModelgateConfig, hours: Option<u64>) -> Result<(), ModelgateError> {
    if config.log.database_path.is_none() {
        eprintln!("modelgate: log.database_path is not set; there is no persistent routing log to read");
    }
    let router = load_router(&config)?;
    let baseline = baseline_model(&config, router.registry())?;
    let store = open_store(&config, LogBackend::Configured).await?;

    let window_hours = hours.unwrap_or(config.log.stats_window_hours);
    let since = i64::try_from(window_hours)
        .ok()
        .and_then(Duration::try_hours)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let stats = stats_since(store.as_ref(), since, baseline.as_ref()).await?;
    print!("{}", render_stats(&stats, window_hours));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelgate_core::ComplexityTier;

    #[test]
    fn empty_report_has_zero_requests() {
        let report = render_stats(&RoutingStats::default(), 24);
        assert!(report.contains("last 24h"));
        assert!(report.contains("requests:      0"));
        assert!(!report.contains("by model"));
    }

    #[test]
    fn report_lists_distribution() {
        let mut stats = RoutingStats {
            total_requests: 3,
            baseline_model: Some("claude-opus-4-1-20250805".into()),
            savings_pct: 97.5,
            ..RoutingStats::default()
        };
        stats.per_tier.insert(ComplexityTier::Simple, 3);
        stats.per_model.insert("gpt-4o-mini".into(), 3);
        let report = render_stats(&stats, 168);
        assert!(report.contains("97.5%"));
        assert!(report.contains("gpt-4o-mini"));
        assert!(report.contains("simple"));
    }
}
