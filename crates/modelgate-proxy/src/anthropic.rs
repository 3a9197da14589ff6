// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native `/v1/messages` adapter.

use async_trait::async_trait;
use modelgate_core::{ModelgateError, Role, WireFormat};
use serde::Serialize;

use crate::adapter::{token_count, CallContext, WireAdapter};
use crate::types::{normalize_finish_reason, Completion, ProxyRequest, TokenUsage};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const MESSAGES_PATH: &str = "/v1/messages";

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<MessageTurn<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct MessageTurn<'a> {
    role: &'static str,
    content: &'a str,
}

pub(crate) fn build_body(request: &ProxyRequest, stream: bool) -> MessagesRequest<'_> {
    let (system, turns) = request.split_system();
    MessagesRequest {
        model: &request.model_id,
        max_tokens: request.max_tokens,
        messages: turns
            .into_iter()
            .map(|m| MessageTurn {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: &m.content,
            })
            .collect(),
        system,
        temperature: request.temperature,
        stream,
    }
}

/// Adapter for the native messages dialect.
#[derive(Debug, Clone)]
pub struct NativeAdapter {
    api_version: String,
}

impl NativeAdapter {
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
        }
    }

    fn request(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
        stream: bool,
    ) -> reqwest::RequestBuilder {
        let builder = ctx
            .post(MESSAGES_PATH, stream)
            .header("anthropic-version", &self.api_version)
            .json(&build_body(request, stream));
        match ctx.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }
}

fn parse_completion(ctx: &CallContext<'_>, body: &serde_json::Value) -> Result<Completion, ModelgateError> {
    let blocks = body["content"]
        .as_array()
        .ok_or_else(|| ctx.malformed("missing `content` array"))?;
    let content = blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect::<String>();

    Ok(Completion {
        content,
        usage: TokenUsage {
            input_tokens: token_count(&body["usage"]["input_tokens"]),
            output_tokens: token_count(&body["usage"]["output_tokens"]),
        },
        finish_reason: body["stop_reason"].as_str().map(normalize_finish_reason),
    })
}

#[async_trait]
impl WireAdapter for NativeAdapter {
    fn format(&self) -> WireFormat {
        WireFormat::Native
    }

    async fn complete(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
    ) -> Result<Completion, ModelgateError> {
        let body = ctx.send_json(self.request(ctx, request, false)).await?;
        parse_completion(ctx, &body)
    }

    async fn open_stream(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
    ) -> Result<reqwest::Response, ModelgateError> {
        ctx.send(self.request(ctx, request, true)).await
    }
}
