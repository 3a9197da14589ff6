// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire adapter trait and shared HTTP plumbing.

use std::time::Duration;

use async_trait::async_trait;
use modelgate_core::{ModelgateError, Provider, WireFormat};
use tracing::debug;

use crate::types::{Completion, ProxyRequest};

/// Where and how to reach one provider for one call.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub client: &'a reqwest::Client,
    pub provider: Provider,
    /// Base URL without a trailing slash.
    pub base_url: &'a str,
    pub api_key: Option<&'a str>,
    /// Whole-request timeout for non-streaming calls.
    pub request_timeout: Duration,
    /// Per-read timeout configured on the client.
    pub idle_timeout: Duration,
    /// Whether this context serves a streaming call.
    pub streaming: bool,
}

impl CallContext<'_> {
    /// POST builder for `path` under the base URL.
    ///
    /// Streaming calls carry no whole-request timeout; their silence is
    /// bounded by the stream translator instead.
    pub fn post(&self, path: &str, streaming: bool) -> reqwest::RequestBuilder {
        let builder = self.client.post(format!("{}{path}", self.base_url));
        if streaming {
            builder
        } else {
            builder.timeout(self.request_timeout)
        }
    }

    /// Send a request and turn any non-2xx status into an upstream error.
    pub async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ModelgateError> {
        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e, "HTTP request failed"))?;

        let status = response.status();
        debug!(provider = %self.provider, status = %status, "upstream response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ModelgateError::Upstream {
            provider: self.provider,
            status: status.as_u16(),
            body,
        })
    }

    /// Send, then decode the body as JSON.
    pub async fn send_json(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, ModelgateError> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .map_err(|e| self.transport_error(e, "failed to read response body"))
    }

    /// The timeout that bounds a silent upstream on this call.
    pub fn effective_timeout(&self) -> Duration {
        if self.streaming {
            self.idle_timeout
        } else {
            self.request_timeout.min(self.idle_timeout)
        }
    }

    pub fn transport_error(&self, err: reqwest::Error, what: &str) -> ModelgateError {
        if err.is_timeout() {
            return ModelgateError::Timeout {
                duration: self.effective_timeout(),
            };
        }
        ModelgateError::Transport {
            provider: self.provider,
            message: format!("{what}: {err}"),
            source: Some(Box::new(err)),
        }
    }

    /// Error for a 2xx body that lacks the fields the adapter needs.
    pub fn malformed(&self, detail: impl std::fmt::Display) -> ModelgateError {
        ModelgateError::Transport {
            provider: self.provider,
            message: format!("malformed response body: {detail}"),
            source: None,
        }
    }
}

/// One handler per wire dialect.
#[async_trait]
pub trait WireAdapter: Send + Sync {
    fn format(&self) -> WireFormat;

    /// Blocking call: send the request and parse the full response.
    async fn complete(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
    ) -> Result<Completion, ModelgateError>;

    /// Streaming call: send the request with streaming enabled and return
    /// the raw response without reading the body.
    async fn open_stream(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
    ) -> Result<reqwest::Response, ModelgateError>;
}

/// Read a token count that may be absent or null.
pub(crate) fn token_count(value: &serde_json::Value) -> u32 {
    value.as_u64().map(|n| n.min(u64::from(u32::MAX)) as u32).unwrap_or(0)
}
