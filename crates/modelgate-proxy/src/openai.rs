// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat Completions adapter, shared by every vendor that speaks the dialect.

use async_trait::async_trait;
use modelgate_core::{ModelgateError, Provider, WireFormat};
use serde::Serialize;

use crate::adapter::{token_count, CallContext, WireAdapter};
use crate::types::{normalize_finish_reason, Completion, ProxyRequest, TokenUsage};

const COMPLETIONS_PATH: &str = "/chat/completions";

/// Default base URL per OpenAI-compatible provider.
///
/// The local provider has no default here; its URL comes from configuration.
pub fn default_base_url(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::OpenAi => Some("https://api.openai.com/v1"),
        Provider::Xai => Some("https://api.x.ai/v1"),
        Provider::DeepSeek => Some("https://api.deepseek.com/v1"),
        Provider::OpenRouter => Some("https://openrouter.ai/api/v1"),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

pub(crate) fn build_body(request: &ProxyRequest, stream: bool) -> ChatRequest<'_> {
    let system = request
        .system
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|content| ChatTurn {
            role: "system".into(),
            content,
        });
    let messages = system
        .into_iter()
        .chain(request.messages.iter().map(|m| ChatTurn {
            role: m.role.to_string(),
            content: &m.content,
        }))
        .collect();

    ChatRequest {
        model: &request.model_id,
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        stream,
        stream_options: stream.then_some(StreamOptions {
            include_usage: true,
        }),
    }
}

/// Adapter for the Chat Completions dialect.
#[derive(Debug, Clone, Default)]
pub struct OpenAiCompatibleAdapter;

impl OpenAiCompatibleAdapter {
    fn request(
        &self,
        ctx: &CallContext<'_>,
        request: &ProxyRequest,
        stream: bool,
    ) -> reqwest::RequestBuilder {
        let builder = ctx.post(COMPLETIONS_PATH, stream).json(&build_body(request, stream));
        // No credential means no Authorization header at all.
        match ctx.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

fn parse_completion(ctx: &CallContext<'_>, body: &serde_json::Value) -> Result<Completion, ModelgateError> {
    let choice = body["choices"]
        .get(0)
        .ok_or_else(|| ctx.malformed("missing `choices[0]`"))?;
    Ok(Completion {
        content: choice["message"]["content"].as_str().unwrap_or_default().to_string(),
        usage: TokenUsage {
            input_tokens: token_count(&body["usage"]["prompt_tokens"]),
            output_tokens: token_count(&body["usage"]["completion_tokens"]),
        },
        finish_reason: choice["finish_reason"].as_str().map(normalize_finish_reason),
    })
}

#[async_trait]
impl WireAdapter for OpenAiCompatibleAdapter {
    fn format(&self) -> WireFormat {
        WireFormat::OpenAiCompatible
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

#[cfg(test)]
mod tests {
    use super::*;
    use modelgate_core::ChatMessage;

    #[test]
    fn system_prompt_becomes_leading_message() {
        let request = ProxyRequest {
            provider: Provider::DeepSeek,
            model_id: "deepseek-chat".into(),
            messages: vec![ChatMessage::user("hi")],
            system: Some("be brief".into()),
            max_tokens: 64,
            temperature: Some(0.5),
        };
        let body = serde_json::to_value(build_body(&request, false)).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("stream_options").is_none());

        let streaming = serde_json::to_value(build_body(&request, true)).unwrap();
        assert_eq!(streaming["stream"], true);
        assert_eq!(streaming["stream_options"]["include_usage"], true);
    }

    #[test]
    fn local_provider_has_no_default_url() {
        assert!(default_base_url(Provider::Ollama).is_none());
        assert_eq!(default_base_url(Provider::Xai), Some("https://api.x.ai/v1"));
    }
}
