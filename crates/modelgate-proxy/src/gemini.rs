// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `generateContent` adapter.
//!
//! Roles map assistant -> `model`, user -> `user`. Text goes inside a
//! `parts` array, the system prompt into `systemInstruction`, and sampling
//! limits into `generationConfig`.

use async_trait::async_trait;
use modelgate_core::{ModelgateError, Role, WireFormat};
use serde::Serialize;

use crate::adapter::{token_count, CallContext, WireAdapter};
use crate::types::{normalize_finish_reason, Completion, ProxyRequest, TokenUsage};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: [OwnedPart; 1],
}

#[derive(Debug, Serialize)]
struct OwnedPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

pub(crate) fn build_body(request: &ProxyRequest) -> GenerateRequest<'_> {
    let (system, turns) = request.split_system();
    GenerateRequest {
        contents: turns
            .into_iter()
            .map(|m| Content {
                role: match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                },
                parts: [Part { text: &m.content }],
            })
            .collect(),
        system_instruction: system.map(|text| SystemInstruction {
            parts: [OwnedPart { text }],
        }),
        generation_config: GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
        },
    }
}

/// Adapter for the alternate vendor dialect.
#[derive(Debug, Clone, Default)]
pub struct AltVendorAdapter;

impl AltVendorAdapter {
    fn request(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
        stream: bool,
    ) -> reqwest::RequestBuilder {
        let path = if stream {
            format!("/models/{}:streamGenerateContent?alt=sse", request.model_id)
        } else {
            format!("/models/{}:generateContent", request.model_id)
        };
        let builder = ctx.post(&path, stream).json(&build_body(request));
        match ctx.api_key {
            Some(key) => builder.header("x-goog-api-key", key),
            None => builder,
        }
    }
}

/// Text, usage, and finish reason from one `generateContent` body.
///
/// Streaming chunks share this shape, so the translator reuses it.
pub(crate) fn parse_candidate(body: &serde_json::Value) -> Option<Completion> {
    let candidate = body["candidates"].get(0)?;
    let content = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect::<String>())
        .unwrap_or_default();
    Some(Completion {
        content,
        usage: TokenUsage {
            input_tokens: token_count(&body["usageMetadata"]["promptTokenCount"]),
            output_tokens: token_count(&body["usageMetadata"]["candidatesTokenCount"]),
        },
        finish_reason: candidate["finishReason"].as_str().map(normalize_finish_reason),
    })
}

#[async_trait]
impl WireAdapter for AltVendorAdapter {
    fn format(&self) -> WireFormat {
        WireFormat::AltVendor
    }

    async fn complete(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
    ) -> Result<Completion, ModelgateError> {
        let body = ctx.send_json(self.request(ctx, request, false)).await?;
        parse_candidate(&body).ok_or_else(|| ctx.malformed("missing `candidates[0]`"))
    }

    async fn open_stream(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
    ) -> Result<reqwest::Response, ModelgateError> {
        ctx.send(self.request(ctx, request, true)).await
    }
}
