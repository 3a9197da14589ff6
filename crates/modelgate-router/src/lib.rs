// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification and model routing for modelgate.
//!
//! This crate provides:
//! - [`dimensions`]: the eight pure dimension scorers
//! - [`Classifier`]: weighted composite scoring and tier assignment
//! - [`OverrideDetector`]: heartbeat, forced-model, and sub-agent overrides
//! - [`ModelRegistry`] and [`RoutingTable`]: the read-only catalog and preference lists
//! - [`Router`]: resolves a request to one concrete model with cascading fallback

pub mod classifier;
pub mod dimensions;
pub mod overrides;
pub mod registry;
pub mod router;
pub mod table;

pub use classifier::{assign_tier, ClassificationResult, Classifier};
pub use dimensions::{DimensionScores, RequestMeta};
pub use overrides::{OverrideDetector, OverrideRequest, OverrideResult};
pub use registry::{configured_providers, ModelRegistry, ModelSpec};
pub use router::{route, Router, RoutingDecision};
pub use table::RoutingTable;
