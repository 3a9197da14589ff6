// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the router and its collaborators.

pub mod log_store;

pub use log_store::RoutingLogStore;
