// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation of vendor stream events into OpenAI-style delta chunks.
//!
//! Each vendor's SSE grammar is decoded with [`SseDecoder`] and mapped onto
//! [`ChatCompletionChunk`]s. Token usage is pulled from whichever event
//! carries it for that vendor. A stream that completes ends with one usage
//! chunk followed by exactly one [`TranslatedEvent::Done`]; a stream that
//! fails ends with the error instead.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use modelgate_core::{ModelgateError, Provider, WireFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter::token_count;
use crate::gemini;
use crate::sse::{SseDecoder, SseEvent};
use crate::types::{normalize_finish_reason, StreamHandle, TokenUsage};

/// OpenAI `chat.completion.chunk` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChunkUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<TokenUsage> for ChunkUsage {
    fn from(usage: TokenUsage) -> Self {
        Self {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            total_tokens: usage.input_tokens.saturating_add(usage.output_tokens),
        }
    }
}

/// Item yielded by [`translate_stream`].
#[derive(Debug, Clone, PartialEq)]
pub enum TranslatedEvent {
    Chunk(ChatCompletionChunk),
    /// Terminal sentinel, emitted exactly once.
    Done { usage: TokenUsage },
}

impl TranslatedEvent {
    /// Payload for an SSE `data:` line. The sentinel renders as `[DONE]`.
    pub fn to_sse_data(&self) -> String {
        match self {
            TranslatedEvent::Chunk(chunk) => serde_json::to_string(chunk).unwrap_or_default(),
            TranslatedEvent::Done { .. } => "[DONE]".to_string(),
        }
    }
}

/// Per-stream translation state.
#[derive(Debug)]
pub struct StreamTranslator {
    format: WireFormat,
    provider: Provider,
    id: String,
    model: String,
    created: i64,
    usage: TokenUsage,
    sent_role: bool,
    finished: bool,
}

impl StreamTranslator {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            format: provider.wire_format(),
            provider,
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            model: model.into(),
            created: chrono::Utc::now().timestamp(),
            usage: TokenUsage::default(),
            sent_role: false,
            finished: false,
        }
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn chunk(&mut self, content: Option<String>, finish_reason: Option<String>) -> ChatCompletionChunk {
        let role = (!self.sent_role).then(|| "assistant".to_string());
        self.sent_role = true;
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".into(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta { role, content },
                finish_reason,
            }],
            usage: None,
        }
    }

    /// Usage chunk plus sentinel. Idempotent: only the first call emits.
    pub fn finish(&mut self) -> Vec<TranslatedEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        let usage_chunk = ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".into(),
            created: self.created,
            model: self.model.clone(),
            choices: Vec::new(),
            usage: Some(self.usage.into()),
        };
        vec![
            TranslatedEvent::Chunk(usage_chunk),
            TranslatedEvent::Done { usage: self.usage },
        ]
    }

    /// Terminal events for an upstream that reached EOF.
    ///
    /// Only the alternate dialect ends at EOF. Native and OpenAI-compatible
    /// streams that close before `message_stop` or `[DONE]` were truncated.
    pub fn finish_at_eof(&mut self) -> Result<Vec<TranslatedEvent>, ModelgateError> {
        if self.finished {
            return Ok(Vec::new());
        }
        if self.format == WireFormat::AltVendor {
            return Ok(self.finish());
        }
        self.finished = true;
        Err(ModelgateError::Transport {
            provider: self.provider,
            message: "upstream stream ended before completion".into(),
            source: None,
        })
    }

    /// Translate one decoded event. Returns any chunks it produces, and the
    /// terminal events when the vendor signals completion.
    pub fn translate(&mut self, event: &SseEvent) -> Result<Vec<TranslatedEvent>, ModelgateError> {
        if self.finished {
            return Ok(Vec::new());
        }
        let data = event.data.trim();
        if data.is_empty() {
            return Ok(Vec::new());
        }
        if self.format == WireFormat::OpenAiCompatible && data == "[DONE]" {
            return Ok(self.finish());
        }

        let value: Value = serde_json::from_str(data).map_err(|e| ModelgateError::Transport {
            provider: self.provider,
            message: format!("invalid JSON in stream event: {e}"),
            source: Some(Box::new(e)),
        })?;

        match self.format {
            WireFormat::Native => self.translate_native(event.event.as_deref(), &value),
            WireFormat::AltVendor => Ok(self.translate_alt_vendor(&value)),
            WireFormat::OpenAiCompatible => Ok(self.translate_openai(&value)),
        }
    }

    fn translate_native(
        &mut self,
        name: Option<&str>,
        value: &Value,
    ) -> Result<Vec<TranslatedEvent>, ModelgateError> {
        // The event name is repeated in the payload's `type`.
        let kind = name.or_else(|| value["type"].as_str()).unwrap_or_default();
        let mut out = Vec::new();
        match kind {
            "message_start" => {
                let usage = &value["message"]["usage"];
                self.usage.input_tokens = token_count(&usage["input_tokens"]);
                self.usage.output_tokens = token_count(&usage["output_tokens"]);
                if let Some(model) = value["message"]["model"].as_str() {
                    self.model = model.to_string();
                }
            }
            "content_block_delta" => {
                if let Some(text) = value["delta"]["text"].as_str() {
                    let chunk = self.chunk(Some(text.to_string()), None);
                    out.push(TranslatedEvent::Chunk(chunk));
                }
            }
            "message_delta" => {
                if let Some(n) = value["usage"]["output_tokens"].as_u64() {
                    self.usage.output_tokens = n.min(u64::from(u32::MAX)) as u32;
                }
                if let Some(reason) = value["delta"]["stop_reason"].as_str() {
                    let chunk = self.chunk(None, Some(normalize_finish_reason(reason)));
                    out.push(TranslatedEvent::Chunk(chunk));
                }
            }
            "message_stop" => out.extend(self.finish()),
            "error" => {
                let message = value["error"]["message"].as_str().unwrap_or("unknown stream error");
                return Err(ModelgateError::Transport {
                    provider: self.provider,
                    message: format!("stream error: {message}"),
                    source: None,
                });
            }
            // ping, content_block_start, content_block_stop, and future event types.
            _ => {}
        }
        Ok(out)
    }

    fn translate_alt_vendor(&mut self, value: &Value) -> Vec<TranslatedEvent> {
        let mut out = Vec::new();
        if value.get("usageMetadata").is_some() {
            let meta = &value["usageMetadata"];
            self.usage.input_tokens = token_count(&meta["promptTokenCount"]);
            self.usage.output_tokens = token_count(&meta["candidatesTokenCount"]);
        }
        if let Some(completion) = gemini::parse_candidate(value) {
            let content = (!completion.content.is_empty()).then_some(completion.content);
            if content.is_some() || completion.finish_reason.is_some() {
                let chunk = self.chunk(content, completion.finish_reason);
                out.push(TranslatedEvent::Chunk(chunk));
            }
        }
        // No sentinel in this dialect: the stream ends at EOF.
        out
    }

    fn translate_openai(&mut self, value: &Value) -> Vec<TranslatedEvent> {
        let mut out = Vec::new();
        if value["usage"].is_object() {
            self.usage.input_tokens = token_count(&value["usage"]["prompt_tokens"]);
            self.usage.output_tokens = token_count(&value["usage"]["completion_tokens"]);
        }
        if let Some(choice) = value["choices"].get(0) {
            let content = choice["delta"]["content"]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(String::from);
            let finish = choice["finish_reason"].as_str().map(normalize_finish_reason);
            if content.is_some() || finish.is_some() {
                let chunk = self.chunk(content, finish);
                out.push(TranslatedEvent::Chunk(chunk));
            }
        }
        out
    }
}

/// Boxed stream of translated events.
pub type TranslatedStream = Pin<Box<dyn Stream<Item = Result<TranslatedEvent, ModelgateError>> + Send>>;

/// Translate an open upstream stream into OpenAI-style events.
///
/// No chunk for longer than `idle_timeout` yields [`ModelgateError::Timeout`]
/// and ends the stream. Dropping the returned stream drops the response body.
pub fn translate_stream(handle: StreamHandle, idle_timeout: Duration) -> TranslatedStream {
    let StreamHandle {
        response,
        model_id,
        provider,
        started_at,
    } = handle;
    debug!(
        provider = %provider,
        model = %model_id,
        open_ms = started_at.elapsed().as_millis() as u64,
        "translating stream"
    );
    translate_bytes(provider, model_id, response.bytes_stream(), idle_timeout)
}

struct State<S> {
    body: Option<Pin<Box<S>>>,
    decoder: SseDecoder,
    translator: StreamTranslator,
    pending: VecDeque<Result<TranslatedEvent, ModelgateError>>,
    idle_timeout: Duration,
}

impl<S> State<S> {
    fn absorb(&mut self, event: &SseEvent) {
        match self.translator.translate(event) {
            Ok(events) => self.pending.extend(events.into_iter().map(Ok)),
            Err(e) => {
                self.pending.push_back(Err(e));
                self.body = None;
            }
        }
        if self.translator.is_finished() {
            self.body = None;
        }
    }
}

/// [`translate_stream`] over any byte stream.
pub fn translate_bytes<S, E>(
    provider: Provider,
    model_id: impl Into<String>,
    body: S,
    idle_timeout: Duration,
) -> TranslatedStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = State {
        body: Some(Box::pin(body)),
        decoder: SseDecoder::new(),
        translator: StreamTranslator::new(provider, model_id),
        pending: VecDeque::new(),
        idle_timeout,
    };

    let events = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            let body = state.body.as_mut()?;
            let next = tokio::time::timeout(state.idle_timeout, body.next()).await;

            match next {
                Err(_) => {
                    warn!(provider = %state.translator.provider, timeout = ?state.idle_timeout, "upstream stream idle");
                    state.body = None;
                    state.pending.push_back(Err(ModelgateError::Timeout {
                        duration: state.idle_timeout,
                    }));
                }
                Ok(Some(Ok(bytes))) => {
                    for event in state.decoder.push(&bytes) {
                        state.absorb(&event);
                        if state.body.is_none() {
                            break;
                        }
                    }
                }
                Ok(Some(Err(e))) => {
                    state.body = None;
                    state.pending.push_back(Err(ModelgateError::Transport {
                        provider: state.translator.provider,
                        message: format!("stream read failed: {e}"),
                        source: Some(Box::new(e)),
                    }));
                }
                Ok(None) => {
                    if let Some(event) = state.decoder.finish() {
                        state.absorb(&event);
                    }
                    state.body = None;
                    match state.translator.finish_at_eof() {
                        Ok(tail) => state.pending.extend(tail.into_iter().map(Ok)),
                        Err(e) => {
                            warn!(provider = %state.translator.provider, "upstream stream truncated");
                            state.pending.push_back(Err(e));
                        }
                    }
                }
            }
        }
    });
    Box::pin(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(
        provider: Provider,
        raw: &'static [&'static str],
    ) -> Vec<Result<TranslatedEvent, ModelgateError>> {
        let chunks = raw
            .iter()
            .map(|s| Ok::<_, std::io::Error>(Bytes::from_static(s.as_bytes())));
        let body = stream::iter(chunks);
        translate_bytes(provider, "m", body, Duration::from_secs(5))
            .collect()
            .await
    }

    fn text_of(events: &[Result<TranslatedEvent, ModelgateError>]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                Ok(TranslatedEvent::Chunk(c)) => c.choices.first().and_then(|ch| ch.delta.content.clone()),
                _ => None,
            })
            .collect()
    }

    fn done_usage(events: &[Result<TranslatedEvent, ModelgateError>]) -> Vec<TokenUsage> {
        events
            .iter()
            .filter_map(|e| match e {
                Ok(TranslatedEvent::Done { usage }) => Some(*usage),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn native_stream_translates_and_extracts_usage() {
        let events = collect(
            Provider::Anthropic,
            &[
                "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"model\":\"claude\",\"usage\":{\"input_tokens\":12,\"output_tokens\":1}}}\n\n",
                "event: ping\ndata: {\"type\":\"ping\"}\n\n",
                "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n\n",
                "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"lo\"}}\n\n",
                "event: message_delta\ndata: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":7}}\n\n",
                "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n",
            ],
        )
        .await;
        assert_eq!(text_of(&events), "Hello");
        assert_eq!(
            done_usage(&events),
            vec![TokenUsage { input_tokens: 12, output_tokens: 7 }]
        );
        assert!(matches!(events.last(), Some(Ok(TranslatedEvent::Done { .. }))));
    }

    #[tokio::test]
    async fn first_chunk_carries_assistant_role() {
        let events = collect(
            Provider::OpenAi,
            &[
                "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n\n",
                "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"b\"}}]}\n\n",
                "data: [DONE]\n\n",
            ],
        )
        .await;
        let roles: Vec<Option<String>> = events
            .iter()
            .filter_map(|e| match e {
                Ok(TranslatedEvent::Chunk(c)) => c.choices.first().map(|ch| ch.delta.role.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(roles, vec![Some("assistant".to_string()), None]);
    }

    #[tokio::test]
    async fn openai_usage_chunk_and_single_sentinel() {
        let events = collect(
            Provider::DeepSeek,
            &[
                "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
                "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n",
                "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
                "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":3,\"completion_tokens\":2}}\n\n",
                "data: [DONE]\n\n",
                "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"ignored\"}}]}\n\n",
            ],
        )
        .await;
        assert_eq!(text_of(&events), "Hi");
        assert_eq!(
            done_usage(&events),
            vec![TokenUsage { input_tokens: 3, output_tokens: 2 }]
        );
    }

    #[tokio::test]
    async fn alt_vendor_stream_finishes_at_eof() {
        let events = collect(
            Provider::Google,
            &[
                "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Bon\"}]}}]}\r\n\r\n",
                "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"jour\"}]},\"finishReason\":\"STOP\"}],",
                "\"usageMetadata\":{\"promptTokenCount\":5,\"candidatesTokenCount\":2}}\r\n\r\n",
            ],
        )
        .await;
        assert_eq!(text_of(&events), "Bonjour");
        assert_eq!(
            done_usage(&events),
            vec![TokenUsage { input_tokens: 5, output_tokens: 2 }]
        );
        let finish = events.iter().find_map(|e| match e {
            Ok(TranslatedEvent::Chunk(c)) => c.choices.first().and_then(|ch| ch.finish_reason.clone()),
            _ => None,
        });
        assert_eq!(finish.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn native_error_event_surfaces() {
        let events = collect(
            Provider::Anthropic,
            &["event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n"],
        )
        .await;
        assert_eq!(events.len(), 1);
        let err = events[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("Overloaded"));
    }

    #[tokio::test]
    async fn native_stream_cut_before_message_stop_is_an_error() {
        let events = collect(
            Provider::Anthropic,
            &[
                "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"model\":\"claude\",\"usage\":{\"input_tokens\":4,\"output_tokens\":1}}}\n\n",
                "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hal\"}}\n\n",
            ],
        )
        .await;
        assert_eq!(text_of(&events), "Hal");
        assert!(done_usage(&events).is_empty());
        assert!(matches!(events.last(), Some(Err(ModelgateError::Transport { .. }))));
    }

    #[tokio::test]
    async fn openai_stream_without_done_is_an_error() {
        let events = collect(
            Provider::OpenAi,
            &["data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"par\"}}]}\n\n"],
        )
        .await;
        assert!(done_usage(&events).is_empty());
        assert!(matches!(events.last(), Some(Err(ModelgateError::Transport { .. }))));
    }

    #[test]
    fn sse_data_rendering() {
        let done = TranslatedEvent::Done { usage: TokenUsage::default() };
        assert_eq!(done.to_sse_data(), "[DONE]");

        let mut translator = StreamTranslator::new(Provider::OpenAi, "gpt-4o-mini");
        let chunk = translator.chunk(Some("x".into()), None);
        let json: Value = serde_json::from_str(&TranslatedEvent::Chunk(chunk).to_sse_data()).unwrap();
        assert_eq!(json["object"], "chat.completion.chunk");
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["choices"][0]["delta"]["content"], "x");
        assert!(json.get("usage").is_none());
    }

    #[tokio::test]
    async fn idle_upstream_times_out() {
        let body = stream::once(async {
            Ok::<_, std::io::Error>(Bytes::from_static(b"data: {\"choices\":[]}\n\n"))
        })
        .chain(stream::pending());
        let mut events = translate_bytes(Provider::OpenAi, "m", body, Duration::from_millis(50));
        let first = events.next().await.unwrap();
        assert!(matches!(first, Err(ModelgateError::Timeout { .. })));
        assert!(events.next().await.is_none());
    }
}
