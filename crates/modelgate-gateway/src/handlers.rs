// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles POST /v1/chat/completions, GET /v1/stats, GET /health.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use modelgate_core::{ChatMessage, Role};
use modelgate_log::{stats_since, RoutingStats};
use modelgate_router::RoutingDecision;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::pipeline::{ChatRequest, GatewayReply};
use crate::server::GatewayState;
use crate::sse;

/// Routing-table mode for this request.
pub const MODE_HEADER: &str = "x-modelgate-mode";
/// Force alias for this request.
pub const FORCE_HEADER: &str = "x-modelgate-force";
/// Request id of the parent, for sub-agent requests.
pub const PARENT_HEADER: &str = "x-modelgate-parent-request";
/// Set on every routed response.
pub const REQUEST_ID_HEADER: &str = "x-modelgate-request-id";
pub const MODEL_HEADER: &str = "x-modelgate-model";

/// Request body for POST /v1/chat/completions.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    /// Accepted for client compatibility. The router picks the model.
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<IncomingMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// One message as OpenAI clients send it.
///
/// Extra fields such as `name`, `tool_calls` and `tool_call_id` are ignored.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// String content or an array of typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageContent {
    /// Text parts joined by newlines. Images and other parts are dropped.
    fn into_text(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .into_iter()
                .filter(|p| p.kind == "text")
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl TryFrom<IncomingMessage> for ChatMessage {
    type Error = ApiError;

    fn try_from(message: IncomingMessage) -> Result<Self, ApiError> {
        let role = match message.role.as_str() {
            "system" | "developer" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            // Tool output goes back to the model as a user turn.
            "tool" | "function" => Role::User,
            other => return Err(ApiError::BadRequest(format!("unsupported message role `{other}`"))),
        };
        Ok(ChatMessage {
            role,
            content: message.content.map(MessageContent::into_text).unwrap_or_default(),
        })
    }
}

/// Response body for POST /v1/chat/completions.
#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
    pub routing: RoutingInfo,
}

#[derive(Debug, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Why the request went where it did.
#[derive(Debug, Serialize)]
pub struct RoutingInfo {
    pub request_id: String,
    pub provider: String,
    pub tier: String,
    pub mode: String,
    pub override_kind: String,
    pub justification: String,
    pub fell_back: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost_usd: Option<f64>,
}

impl RoutingInfo {
    pub fn from_decision(request_id: &str, decision: &RoutingDecision) -> Self {
        Self {
            request_id: request_id.to_string(),
            provider: decision.model.provider.to_string(),
            tier: decision.tier.to_string(),
            mode: decision.mode.clone(),
            override_kind: decision.override_kind.to_string(),
            justification: decision.justification.clone(),
            fell_back: decision.fell_back,
            latency_ms: None,
            estimated_cost_usd: None,
        }
    }
}

impl From<GatewayReply> for ChatCompletionResponse {
    fn from(reply: GatewayReply) -> Self {
        let GatewayReply {
            request_id,
            response,
            decision,
            estimated_cost_usd,
        } = reply;
        let mut routing = RoutingInfo::from_decision(&request_id, &decision);
        routing.latency_ms = Some(response.latency_ms);
        routing.estimated_cost_usd = Some(estimated_cost_usd);

        Self {
            id: format!("chatcmpl-{request_id}"),
            object: "chat.completion",
            created: Utc::now().timestamp(),
            model: response.model_id,
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(response.content),
                finish_reason: response.finish_reason,
            }],
            usage: Usage {
                prompt_tokens: response.input_tokens,
                completion_tokens: response.output_tokens,
                total_tokens: response.input_tokens.saturating_add(response.output_tokens),
            },
            routing,
        }
    }
}

/// Query parameters for GET /v1/stats.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub hours: Option<u64>,
}

/// Response body for GET /v1/stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub window_hours: u64,
    #[serde(flatten)]
    pub stats: RoutingStats,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub providers_configured: bool,
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Attach the request id and chosen model to a response.
pub(crate) fn with_routing_headers(mut response: Response, request_id: &str, model_id: &str) -> Response {
    let headers = response.headers_mut();
    for (name, value) in [(REQUEST_ID_HEADER, request_id), (MODEL_HEADER, model_id)] {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    response
}

/// POST /v1/chat/completions
///
/// Routes the conversation and returns the vendor's reply in Chat
/// Completions shape. With `"stream": true` the reply is an SSE stream of
/// `chat.completion.chunk` objects ending in `[DONE]`.
pub async fn post_chat_completions(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<ChatCompletionRequest>,
) -> Result<Response, ApiError> {
    if body.messages.is_empty() {
        return Err(ApiError::BadRequest("`messages` must not be empty".into()));
    }

    let messages = body
        .messages
        .into_iter()
        .map(ChatMessage::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let request = ChatRequest {
        messages,
        mode: header_str(&headers, MODE_HEADER),
        force: header_str(&headers, FORCE_HEADER),
        parent_request_id: header_str(&headers, PARENT_HEADER),
        max_tokens: body.max_tokens,
        temperature: body.temperature,
    };

    if body.stream {
        let reply = state.pipeline.stream(request).await?;
        return Ok(sse::into_response(reply));
    }

    let reply = state.pipeline.complete(request).await?;
    let request_id = reply.request_id.clone();
    let model_id = reply.decision.model.id.clone();
    let response = Json(ChatCompletionResponse::from(reply)).into_response();
    Ok(with_routing_headers(response, &request_id, &model_id))
}

/// GET /v1/stats
///
/// Aggregates the routing log over the last `hours` (default from config).
pub async fn get_stats(
    State(state): State<GatewayState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    let window_hours = query.hours.unwrap_or(state.stats.window_hours);
    let hours = i64::try_from(window_hours).unwrap_or(i64::MAX);
    let since = Duration::try_hours(hours)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let stats = stats_since(
        state.pipeline.log().as_ref(),
        since,
        state.stats.baseline.as_ref(),
    )
    .await?;
    Ok(Json(StatsResponse {
        window_hours,
        stats,
    }))
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        providers_configured: state.pipeline.router().registry().has_configured_provider(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(json: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let req: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        req.messages.into_iter().map(ChatMessage::try_from).collect()
    }

    #[test]
    fn request_deserializes_openai_body() {
        let json = r#"{
            "model": "auto",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ],
            "max_tokens": 64
        }"#;
        let req: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.messages.len(), 2);
        assert!(!req.stream);
        assert_eq!(req.max_tokens, Some(64));
        assert!(req.temperature.is_none());

        let messages = convert(json).unwrap();
        assert_eq!(messages[0], ChatMessage::system("be brief"));
        assert_eq!(messages[1], ChatMessage::user("hi"));
    }

    #[test]
    fn stock_client_roles_and_content_parts_are_accepted() {
        let json = r#"{
            "messages": [
                {"role": "developer", "content": "answer in French"},
                {"role": "user", "content": [
                    {"type": "text", "text": "what is in"},
                    {"type": "image_url", "image_url": {"url": "https://example.com/a.png"}},
                    {"type": "text", "text": "this picture?"}
                ]},
                {"role": "assistant", "content": null, "tool_calls": [
                    {"id": "call_1", "type": "function", "function": {"name": "look", "arguments": "{}"}}
                ]},
                {"role": "tool", "tool_call_id": "call_1", "content": "a cat"}
            ]
        }"#;
        let messages = convert(json).unwrap();
        assert_eq!(
            messages,
            vec![
                ChatMessage::system("answer in French"),
                ChatMessage::user("what is in\nthis picture?"),
                ChatMessage::assistant(""),
                ChatMessage::user("a cat"),
            ]
        );
    }

    #[test]
    fn unknown_role_is_a_bad_request() {
        let err = convert(r#"{"messages": [{"role": "narrator", "content": "once"}]}"#).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m.contains("narrator")));
    }

    #[test]
    fn header_values_are_trimmed_and_blank_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(MODE_HEADER, HeaderValue::from_static(" eco "));
        headers.insert(FORCE_HEADER, HeaderValue::from_static(""));
        assert_eq!(header_str(&headers, MODE_HEADER).as_deref(), Some("eco"));
        assert_eq!(header_str(&headers, FORCE_HEADER), None);
        assert_eq!(header_str(&headers, PARENT_HEADER), None);
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            providers_configured: true,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
    }
}
