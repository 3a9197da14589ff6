// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for modelgate.
//!
//! Provides the error type, the value types shared by the classifier,
//! router, proxy, and routing log, and the [`RoutingLogStore`] trait.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ModelgateError;
pub use traits::RoutingLogStore;
pub use types::{
    last_user_message, ChatMessage, ComplexityTier, OverrideKind, Provider, Role,
    RoutingLogEntry, WireFormat,
};
