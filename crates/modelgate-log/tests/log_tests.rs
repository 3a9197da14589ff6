// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite routing log and writer.

use std::sync::Arc;

use chrono::{Duration, Utc};
use modelgate_core::{ComplexityTier, OverrideKind, Provider, RoutingLogEntry, RoutingLogStore};
use modelgate_log::{fingerprint, stats_since, LogWriter, SqliteRoutingLog};
use modelgate_router::ModelRegistry;
use modelgate_config::model::ProvidersConfig;

fn entry(id: &str, minutes_ago: i64, model_id: &str, provider: Provider) -> RoutingLogEntry {
    RoutingLogEntry {
        request_id: id.into(),
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
        prompt_fingerprint: fingerprint(id),
        composite_score: 0.3,
        tier: ComplexityTier::Standard,
        model_id: model_id.into(),
        provider,
        mode: "standard".into(),
        override_kind: OverrideKind::None,
        input_tokens: 2000,
        output_tokens: 1000,
        estimated_cost_usd: 0.001,
        latency_ms: 400,
    }
}

#[tokio::test]
async fn log_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routing.db");

    {
        let log = SqliteRoutingLog::open(&path).await.unwrap();
        log.append(&entry("parent", 5, "gpt-4o", Provider::OpenAi)).await.unwrap();
    }

    let log = SqliteRoutingLog::open(&path).await.unwrap();
    let parent = log.find_by_request_id("parent").await.unwrap().unwrap();
    assert_eq!(parent.model_id, "gpt-4o");
    assert_eq!(parent.provider, Provider::OpenAi);
}

#[tokio::test]
async fn writer_feeds_sqlite_and_stats_read_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteRoutingLog::open(dir.path().join("log.db")).await.unwrap());

    let writer = LogWriter::spawn(store.clone(), 8);
    writer.submit(entry("old", 60 * 48, "gpt-4o", Provider::OpenAi));
    writer.submit(entry("a", 30, "gpt-4o-mini", Provider::OpenAi));
    writer.submit(entry("b", 10, "gemini-2.5-flash", Provider::Google));
    assert_eq!(writer.shutdown().await, 3);

    let registry = ModelRegistry::builtin(&ProvidersConfig::default()).unwrap();
    let baseline = registry.most_expensive().cloned();
    let stats = stats_since(store.as_ref(), Utc::now() - Duration::hours(24), baseline.as_ref())
        .await
        .unwrap();

    assert_eq!(stats.total_requests, 2);
    assert!((stats.actual_cost_usd - 0.002).abs() < 1e-12);
    assert_eq!(stats.per_provider.get(&Provider::Google), Some(&1));
    assert!(!stats.per_model.contains_key("gpt-4o"));
    assert!(stats.savings_pct > 0.0 && stats.savings_pct <= 100.0);
}
