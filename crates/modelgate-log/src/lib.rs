// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing log for modelgate.
//!
//! Every completed request is appended as one immutable
//! [`RoutingLogEntry`](modelgate_core::RoutingLogEntry). Two stores implement
//! [`RoutingLogStore`](modelgate_core::RoutingLogStore): an in-memory one for
//! dry runs and tests, and a SQLite one for deployments. Writes from the
//! request path go through [`LogWriter`], which never blocks the response.

pub mod fingerprint;
pub mod memory;
pub mod pricing;
pub mod sqlite;
pub mod stats;
pub mod writer;

pub use fingerprint::{fingerprint, fingerprint_messages};
pub use memory::MemoryRoutingLog;
pub use pricing::estimate_cost;
pub use sqlite::SqliteRoutingLog;
pub use stats::{compute_stats, stats_since, RoutingStats};
pub use writer::{LogSender, LogWriter};
