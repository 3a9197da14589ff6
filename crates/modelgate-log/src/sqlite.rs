// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite routing log.
//!
//! All statements run on the single tokio-rusqlite background thread, so
//! appends are serialized and reads never see a half-written row.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modelgate_core::{ModelgateError, RoutingLogEntry, RoutingLogStore};
use rusqlite::types::Type;
use tracing::{debug, info};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS routing_log (
    request_id TEXT PRIMARY KEY NOT NULL,
    timestamp TEXT NOT NULL,
    prompt_fingerprint TEXT NOT NULL,
    composite_score REAL NOT NULL,
    tier TEXT NOT NULL,
    model_id TEXT NOT NULL,
    provider TEXT NOT NULL,
    mode TEXT NOT NULL,
    override_kind TEXT NOT NULL,
    input_tokens INTEGER NOT NULL DEFAULT 0,
    output_tokens INTEGER NOT NULL DEFAULT 0,
    estimated_cost_usd REAL NOT NULL DEFAULT 0.0,
    latency_ms INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_routing_log_timestamp ON routing_log(timestamp);
CREATE INDEX IF NOT EXISTS idx_routing_log_model ON routing_log(model_id);";

const COLUMNS: &str = "request_id, timestamp, prompt_fingerprint, composite_score, tier, \
     model_id, provider, mode, override_kind, input_tokens, output_tokens, \
     estimated_cost_usd, latency_ms";

/// Convert a tokio-rusqlite error into ModelgateError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ModelgateError {
    ModelgateError::Storage {
        source: Box::new(e),
    }
}

/// Fixed-width UTC timestamps so text comparison orders chronologically.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn parse_column<T, E>(idx: usize, raw: &str, parse: impl FnOnce(&str) -> Result<T, E>) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parse(raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RoutingLogEntry> {
    let timestamp: String = row.get(1)?;
    let tier: String = row.get(4)?;
    let provider: String = row.get(6)?;
    let override_kind: String = row.get(8)?;
    let latency_ms: i64 = row.get(12)?;

    Ok(RoutingLogEntry {
        request_id: row.get(0)?,
        timestamp: parse_column(1, &timestamp, |s| {
            DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
        })?,
        prompt_fingerprint: row.get(2)?,
        composite_score: row.get(3)?,
        tier: parse_column(4, &tier, FromStr::from_str)?,
        model_id: row.get(5)?,
        provider: parse_column(6, &provider, FromStr::from_str)?,
        mode: row.get(7)?,
        override_kind: parse_column(8, &override_kind, FromStr::from_str)?,
        input_tokens: row.get(9)?,
        output_tokens: row.get(10)?,
        estimated_cost_usd: row.get(11)?,
        latency_ms: latency_ms.max(0) as u64,
    })
}

/// Persistent routing log backed by SQLite.
pub struct SqliteRoutingLog {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for SqliteRoutingLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRoutingLog").finish_non_exhaustive()
    }
}

impl SqliteRoutingLog {
    /// Wrap an existing connection, creating the schema if needed.
    pub async fn new(conn: tokio_rusqlite::Connection) -> Result<Self, ModelgateError> {
        conn.call(|conn| conn.execute_batch(SCHEMA))
            .await
            .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Open (or create) the log database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ModelgateError> {
        let path = path.as_ref().to_path_buf();
        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| ModelgateError::Storage {
                source: Box::new(e),
            })?;
        let log = Self::new(conn).await?;
        info!(path = %path.display(), "routing log opened");
        Ok(log)
    }

    /// In-memory database, mostly for tests.
    pub async fn open_in_memory() -> Result<Self, ModelgateError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| ModelgateError::Storage {
                source: Box::new(e),
            })?;
        Self::new(conn).await
    }
}

#[async_trait]
impl RoutingLogStore for SqliteRoutingLog {
    async fn append(&self, entry: &RoutingLogEntry) -> Result<(), ModelgateError> {
        let request_id = entry.request_id.clone();
        let timestamp = format_timestamp(&entry.timestamp);
        let fingerprint = entry.prompt_fingerprint.clone();
        let composite = entry.composite_score;
        let tier = entry.tier.to_string();
        let model_id = entry.model_id.clone();
        let provider = entry.provider.to_string();
        let mode = entry.mode.clone();
        let override_kind = entry.override_kind.to_string();
        let input_tokens = entry.input_tokens;
        let output_tokens = entry.output_tokens;
        let cost = entry.estimated_cost_usd;
        let latency_ms = i64::try_from(entry.latency_ms).unwrap_or(i64::MAX);

        self.conn
            .call(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO routing_log ({COLUMNS}) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                    ),
                    rusqlite::params![
                        request_id,
                        timestamp,
                        fingerprint,
                        composite,
                        tier,
                        model_id,
                        provider,
                        mode,
                        override_kind,
                        input_tokens,
                        output_tokens,
                        cost,
                        latency_ms,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(
            request_id = %entry.request_id,
            model = %entry.model_id,
            tier = %entry.tier,
            "routing log entry appended"
        );
        Ok(())
    }

    async fn find_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Option<RoutingLogEntry>, ModelgateError> {
        let request_id = request_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM routing_log WHERE request_id = ?1"
                ))?;
                let mut rows = stmt.query_map(rusqlite::params![request_id], entry_from_row)?;
                let found = rows.next().transpose()?;
                Ok(found)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn entries_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<RoutingLogEntry>, ModelgateError> {
        let since = format_timestamp(&since);
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM routing_log WHERE timestamp >= ?1 ORDER BY timestamp ASC"
                ))?;
                let rows = stmt.query_map(rusqlite::params![since], entry_from_row)?;
                let entries = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(map_tr_err)
    }
}
