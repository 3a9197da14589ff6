// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request pipeline and HTTP gateway for modelgate.
//!
//! [`Pipeline`] runs the per-request control flow: classify the last user
//! turn, detect overrides, resolve a model, dispatch to the vendor, and queue
//! a routing log entry. [`build_router`] exposes it over an
//! OpenAI-compatible `POST /v1/chat/completions` plus stats and health.

pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod server;
pub mod sse;

pub use error::ApiError;
pub use pipeline::{ChatRequest, GatewayReply, Pipeline, RoutePlan, StreamingReply};
pub use server::{build_router, start_server, GatewayState, ServerConfig, StatsSettings};
