// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory routing log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modelgate_core::{ModelgateError, RoutingLogEntry, RoutingLogStore};
use tokio::sync::RwLock;

/// Routing log held in a `Vec`. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryRoutingLog {
    entries: RwLock<Vec<RoutingLogEntry>>,
}

impl MemoryRoutingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RoutingLogStore for MemoryRoutingLog {
    async fn append(&self, entry: &RoutingLogEntry) -> Result<(), ModelgateError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn find_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Option<RoutingLogEntry>, ModelgateError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().find(|e| e.request_id == request_id).cloned())
    }

    async fn entries_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<RoutingLogEntry>, ModelgateError> {
        let entries = self.entries.read().await;
        let mut found: Vec<RoutingLogEntry> =
            entries.iter().filter(|e| e.timestamp >= since).cloned().collect();
        found.sort_by_key(|e| e.timestamp);
        Ok(found)
    }
}
