// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget log writer.
//!
//! Request handlers hand entries to a bounded queue and return immediately.
//! One background task drains the queue into the store, so appends reach the
//! store in submission order. A reader may briefly miss an entry that is
//! still queued.

use std::sync::Arc;

use modelgate_core::{RoutingLogEntry, RoutingLogStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Cloneable submission handle.
#[derive(Debug, Clone)]
pub struct LogSender {
    tx: mpsc::Sender<RoutingLogEntry>,
}

impl LogSender {
    /// Queue an entry without waiting.
    ///
    /// Returns false when the entry was dropped because the queue is full or
    /// the writer has stopped.
    pub fn submit(&self, entry: RoutingLogEntry) -> bool {
        match self.tx.try_send(entry) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(entry)) => {
                warn!(request_id = %entry.request_id, "routing log queue full, entry dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                warn!(request_id = %entry.request_id, "routing log writer stopped, entry dropped");
                false
            }
        }
    }
}

/// Owns the background task that drains submitted entries into a store.
#[derive(Debug)]
pub struct LogWriter {
    sender: LogSender,
    task: JoinHandle<u64>,
}

impl LogWriter {
    /// Spawn the writer task on the current runtime.
    pub fn spawn(store: Arc<dyn RoutingLogStore>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<RoutingLogEntry>(capacity.max(1));
        let task = tokio::spawn(async move {
            let mut written = 0u64;
            while let Some(entry) = rx.recv().await {
                match store.append(&entry).await {
                    Ok(()) => written += 1,
                    Err(e) => {
                        warn!(request_id = %entry.request_id, error = %e, "routing log append failed");
                    }
                }
            }
            debug!(written, "routing log writer drained");
            written
        });
        Self {
            sender: LogSender { tx },
            task,
        }
    }

    pub fn sender(&self) -> LogSender {
        self.sender.clone()
    }

    /// Queue an entry without waiting. See [`LogSender::submit`].
    pub fn submit(&self, entry: RoutingLogEntry) -> bool {
        self.sender.submit(entry)
    }

    /// Stop accepting entries, drain the queue, and wait for the task.
    ///
    /// Completes once every [`LogSender`] clone has been dropped. Returns the
    /// number of entries written.
    pub async fn shutdown(self) -> u64 {
        drop(self.sender);
        match self.task.await {
            Ok(written) => written,
            Err(e) => {
                warn!(error = %e, "routing log writer task failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRoutingLog;
    use chrono::Utc;
    use modelgate_core::{ComplexityTier, OverrideKind, Provider};

    fn entry(id: &str) -> RoutingLogEntry {
        RoutingLogEntry {
            request_id: id.into(),
            timestamp: Utc::now(),
            prompt_fingerprint: String::new(),
            composite_score: 0.0,
            tier: ComplexityTier::Simple,
            model_id: "gemini-2.5-flash-lite".into(),
            provider: Provider::Google,
            mode: "eco".into(),
            override_kind: OverrideKind::Heartbeat,
            input_tokens: 1,
            output_tokens: 1,
            estimated_cost_usd: 0.0,
            latency_ms: 5,
        }
    }

    #[tokio::test]
    async fn drains_in_order_on_shutdown() {
        let store = Arc::new(MemoryRoutingLog::new());
        let writer = LogWriter::spawn(store.clone(), 16);
        for i in 0..5 {
            assert!(writer.submit(entry(&format!("r{i}"))));
        }
        assert_eq!(writer.shutdown().await, 5);

        let entries = store.entries_since(Utc::now() - chrono::Duration::hours(1)).await.unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.request_id.as_str()).collect();
        assert_eq!(ids, ["r0", "r1", "r2", "r3", "r4"]);
    }

    #[tokio::test]
    async fn sender_clones_outlive_the_writer_handle() {
        let store = Arc::new(MemoryRoutingLog::new());
        let writer = LogWriter::spawn(store.clone(), 4);
        let sender = writer.sender();
        assert!(sender.submit(entry("a")));
        drop(sender);
        assert_eq!(writer.shutdown().await, 1);
        assert!(store.find_by_request_id("a").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn full_queue_drops_instead_of_blocking() {
        let store = Arc::new(MemoryRoutingLog::new());
        let writer = LogWriter::spawn(store.clone(), 1);
        // The writer task cannot run until this task yields, so the second
        // submit finds the single slot occupied.
        assert!(writer.submit(entry("kept")));
        assert!(!writer.submit(entry("dropped")));
        assert_eq!(writer.shutdown().await, 1);
        assert!(store.find_by_request_id("dropped").await.unwrap().is_none());
    }
}
