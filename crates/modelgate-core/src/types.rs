// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value types shared across the classifier, router, proxy, and routing log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// LLM vendors modelgate can dispatch to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    Google,
    OpenAi,
    Xai,
    DeepSeek,
    OpenRouter,
    Ollama,
}

impl Provider {
    /// Every provider, in declaration order.
    pub const ALL: [Provider; 7] = [
        Provider::Anthropic,
        Provider::Google,
        Provider::OpenAi,
        Provider::Xai,
        Provider::DeepSeek,
        Provider::OpenRouter,
        Provider::Ollama,
    ];

    /// The wire protocol family this provider speaks.
    pub fn wire_format(self) -> WireFormat {
        match self {
            Provider::Anthropic => WireFormat::Native,
            Provider::Google => WireFormat::AltVendor,
            Provider::OpenAi
            | Provider::Xai
            | Provider::DeepSeek
            | Provider::OpenRouter
            | Provider::Ollama => WireFormat::OpenAiCompatible,
        }
    }

    /// Locally reachable providers need a base URL but no credential.
    pub fn is_local(self) -> bool {
        matches!(self, Provider::Ollama)
    }
}

/// Request/response dialects spoken by upstream vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum WireFormat {
    /// `/v1/messages` shape with a top-level system field.
    Native,
    /// `generateContent` shape with role-mapped `contents` and `parts`.
    AltVendor,
    /// OpenAI Chat Completions shape.
    OpenAiCompatible,
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Text of the last user turn in a conversation, if any.
pub fn last_user_message(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}

/// Complexity buckets produced by the classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Simple,
    Standard,
    Complex,
}

/// Which override, if any, bypassed classification-based routing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    None,
    Heartbeat,
    ForceModel,
    /// Legacy alias kinds kept for log compatibility.
    ForceOpus,
    ForceSonnet,
    ForceFlash,
    SubAgentInherit,
    SubAgentStepdown,
}

/// One durable record per completed request.
///
/// Entries are append-only. The prompt is stored only as a fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub prompt_fingerprint: String,
    pub composite_score: f64,
    pub tier: ComplexityTier,
    pub model_id: String,
    pub provider: Provider,
    pub mode: String,
    pub override_kind: OverrideKind,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub estimated_cost_usd: f64,
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn provider_names_round_trip() {
        for provider in Provider::ALL {
            let s = provider.to_string();
            assert_eq!(Provider::from_str(&s).unwrap(), provider);
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{s}\""));
        }
        assert_eq!(Provider::OpenAi.to_string(), "openai");
        assert_eq!(Provider::DeepSeek.to_string(), "deepseek");
    }

    #[test]
    fn wire_formats_cover_three_dialects() {
        assert_eq!(Provider::Anthropic.wire_format(), WireFormat::Native);
        assert_eq!(Provider::Google.wire_format(), WireFormat::AltVendor);
        for p in [
            Provider::OpenAi,
            Provider::Xai,
            Provider::DeepSeek,
            Provider::OpenRouter,
            Provider::Ollama,
        ] {
            assert_eq!(p.wire_format(), WireFormat::OpenAiCompatible);
        }
    }

    #[test]
    fn override_kind_snake_case() {
        assert_eq!(OverrideKind::SubAgentStepdown.to_string(), "sub_agent_stepdown");
        assert_eq!(OverrideKind::ForceOpus.to_string(), "force_opus");
        assert_eq!(
            OverrideKind::from_str("sub_agent_inherit").unwrap(),
            OverrideKind::SubAgentInherit
        );
    }

    #[test]
    fn last_user_message_skips_assistant_turns() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
            ChatMessage::assistant("another reply"),
        ];
        assert_eq!(last_user_message(&messages), Some("second"));
        assert_eq!(last_user_message(&[]), None);
    }

    #[test]
    fn tier_display() {
        assert_eq!(ComplexityTier::Simple.to_string(), "simple");
        assert_eq!(ComplexityTier::Standard.to_string(), "standard");
        assert_eq!(ComplexityTier::Complex.to_string(), "complex");
    }
}
