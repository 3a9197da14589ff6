// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-agnostic request and response shapes.

use std::time::Instant;

use modelgate_core::{ChatMessage, Provider, Role};
use serde::{Deserialize, Serialize};

/// A request ready for dispatch to one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRequest {
    pub provider: Provider,
    pub model_id: String,
    /// Ordered conversation turns.
    pub messages: Vec<ChatMessage>,
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl ProxyRequest {
    /// System prompt and the non-system turns.
    ///
    /// System-role messages found inside `messages` are appended to the
    /// dedicated system prompt, for vendors that reject them inline.
    pub fn split_system(&self) -> (Option<String>, Vec<&ChatMessage>) {
        let mut system: Vec<&str> = self.system.as_deref().into_iter().collect();
        let mut turns = Vec::with_capacity(self.messages.len());
        for message in &self.messages {
            match message.role {
                Role::System => system.push(&message.content),
                _ => turns.push(message),
            }
        }
        let system = system
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>();
        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, turns)
    }
}

/// Token counts reported by a vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// What a wire adapter extracts from a successful non-streaming body.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Uniform non-streaming response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub model_id: String,
    pub provider: Provider,
    pub latency_ms: u64,
    /// Normalized to `stop`, `length`, `content_filter`, or `tool_calls`
    /// when the vendor value is recognized; passed through otherwise.
    pub finish_reason: Option<String>,
}

/// An open upstream stream plus the metadata needed to decode it.
///
/// Dropping the handle drops the response body and releases the connection.
#[derive(Debug)]
pub struct StreamHandle {
    pub response: reqwest::Response,
    pub model_id: String,
    pub provider: Provider,
    pub started_at: Instant,
}

/// Map vendor stop reasons onto the OpenAI vocabulary.
pub fn normalize_finish_reason(raw: &str) -> String {
    match raw {
        "end_turn" | "stop_sequence" | "STOP" | "stop" => "stop",
        "max_tokens" | "MAX_TOKENS" | "length" => "length",
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "content_filter" => {
            "content_filter"
        }
        "tool_use" | "tool_calls" => "tool_calls",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(system: Option<&str>, messages: Vec<ChatMessage>) -> ProxyRequest {
        ProxyRequest {
            provider: Provider::Anthropic,
            model_id: "m".into(),
            messages,
            system: system.map(String::from),
            max_tokens: 16,
            temperature: None,
        }
    }

    #[test]
    fn split_system_merges_inline_system_turns() {
        let req = request(
            Some("be terse"),
            vec![
                ChatMessage::system("answer in French"),
                ChatMessage::user("hello"),
                ChatMessage::assistant("bonjour"),
            ],
        );
        let (system, turns) = req.split_system();
        assert_eq!(system.as_deref(), Some("be terse\n\nanswer in French"));
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
    }

    #[test]
    fn split_system_drops_blank_prompts() {
        let req = request(Some("  "), vec![ChatMessage::user("hi")]);
        assert_eq!(req.split_system().0, None);
    }

    #[test]
    fn finish_reasons_normalize() {
        assert_eq!(normalize_finish_reason("end_turn"), "stop");
        assert_eq!(normalize_finish_reason("MAX_TOKENS"), "length");
        assert_eq!(normalize_finish_reason("SAFETY"), "content_filter");
        assert_eq!(normalize_finish_reason("tool_use"), "tool_calls");
        assert_eq!(normalize_finish_reason("weird"), "weird");
    }
}
