// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only routing log backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ModelgateError;
use crate::types::RoutingLogEntry;

/// Storage for [`RoutingLogEntry`] records.
///
/// Reads are eventually consistent with writes submitted through a
/// fire-and-forget writer: a lookup may miss an entry whose write is still
/// queued. Callers treat a miss as "not found", never as an error.
#[async_trait]
pub trait RoutingLogStore: Send + Sync {
    /// Append one entry. Entries are never updated or deleted.
    async fn append(&self, entry: &RoutingLogEntry) -> Result<(), ModelgateError>;

    /// Find the entry recorded for a request id.
    async fn find_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Option<RoutingLogEntry>, ModelgateError>;

    /// All entries with `timestamp >= since`, oldest first.
    async fn entries_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<RoutingLogEntry>, ModelgateError>;
}
