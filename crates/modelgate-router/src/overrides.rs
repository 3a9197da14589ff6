// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Override detection: decides whether classification should be bypassed.
//!
//! Precedence, first match wins:
//! 1. heartbeat/summary shortcut on the last user message
//! 2. explicit force alias supplied by the caller
//! 3. `/alias` prefix on the last user message (only without an explicit alias)
//! 4. sub-agent inheritance or step-down from a logged parent request
//! 5. no override
//!
//! The parent lookup is eventually consistent: the parent's log entry may not
//! be written yet, in which case the detector warns and falls through.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use modelgate_config::model::OverridesConfig;
use modelgate_core::{last_user_message, ChatMessage, OverrideKind, RoutingLogStore};
use regex::Regex;
use tracing::{debug, warn};

/// Outcome of override detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideResult {
    pub kind: OverrideKind,
    /// Model forced by the override. When present it fully supersedes
    /// classification-based routing.
    pub model_id: Option<String>,
}

impl OverrideResult {
    pub fn none() -> Self {
        Self {
            kind: OverrideKind::None,
            model_id: None,
        }
    }

    pub fn forced(kind: OverrideKind, model_id: impl Into<String>) -> Self {
        Self {
            kind,
            model_id: Some(model_id.into()),
        }
    }

    /// The forced model id, if this override bypasses the routing table.
    pub fn forced_model(&self) -> Option<&str> {
        match self.kind {
            OverrideKind::None => None,
            _ => self.model_id.as_deref(),
        }
    }
}

/// Per-request inputs to override detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideRequest<'a> {
    pub messages: &'a [ChatMessage],
    /// Caller-supplied short alias such as `opus` or `grok`.
    pub force_alias: Option<&'a str>,
    /// Request id of the parent when this request comes from a sub-agent.
    pub parent_request_id: Option<&'a str>,
}

static HEARTBEAT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(ping|pong|heartbeat|hb|alive\??|status\??|test)$",
        r"(?i)^(summari[sz]e|tl;?dr)( (this|that|it|the above|the conversation|the thread))?[.!?]?$",
        r"(?i)^give me a (quick |brief |short )?summary[.!?]?$",
        r"(?i)^(are you (there|alive|up)|you there)\??$",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static SLASH_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([A-Za-z0-9_.-]+)(\s|$)").expect("valid regex"));

/// True when `text` is a heartbeat ping or a bare summary request.
pub fn is_heartbeat(text: &str) -> bool {
    let trimmed = text.trim();
    HEARTBEAT_PATTERNS.iter().any(|re| re.is_match(trimmed))
}

/// Alias named by a leading `/alias` token, if any.
pub fn slash_alias(text: &str) -> Option<&str> {
    SLASH_COMMAND
        .captures(text.trim_start())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Detects heartbeat, forced-model, and sub-agent overrides.
///
/// The alias table and step-down hierarchy are plain values handed to the
/// constructor, so tests can substitute their own.
#[derive(Debug, Clone)]
pub struct OverrideDetector {
    heartbeat_model: String,
    aliases: BTreeMap<String, String>,
    hierarchy: Vec<String>,
}

impl OverrideDetector {
    pub fn new(config: &OverridesConfig) -> Self {
        Self::with_tables(
            config.heartbeat_model.clone(),
            config.aliases.clone(),
            config.hierarchy.clone(),
        )
    }

    pub fn with_tables(
        heartbeat_model: impl Into<String>,
        aliases: BTreeMap<String, String>,
        hierarchy: Vec<String>,
    ) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(alias, id)| (alias.to_lowercase(), id))
            .collect();
        Self {
            heartbeat_model: heartbeat_model.into(),
            aliases,
            hierarchy,
        }
    }

    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    /// Resolve a short alias to `(kind, model id)`.
    pub fn resolve_alias(&self, alias: &str) -> Option<(OverrideKind, &str)> {
        let alias = alias.trim().to_lowercase();
        let id = self.aliases.get(&alias)?;
        let kind = match alias.as_str() {
            "opus" => OverrideKind::ForceOpus,
            "sonnet" => OverrideKind::ForceSonnet,
            "flash" => OverrideKind::ForceFlash,
            _ => OverrideKind::ForceModel,
        };
        Some((kind, id.as_str()))
    }

    /// Run the precedence chain.
    pub async fn detect(
        &self,
        request: &OverrideRequest<'_>,
        log: &dyn RoutingLogStore,
    ) -> OverrideResult {
        let last_user = last_user_message(request.messages).unwrap_or("");

        if is_heartbeat(last_user) {
            debug!(model = %self.heartbeat_model, "heartbeat override");
            return OverrideResult::forced(OverrideKind::Heartbeat, &self.heartbeat_model);
        }

        match request.force_alias.filter(|a| !a.trim().is_empty()) {
            Some(alias) => match self.resolve_alias(alias) {
                Some((kind, id)) => {
                    debug!(alias, model = id, "explicit force override");
                    return OverrideResult::forced(kind, id);
                }
                None => warn!(alias, "unknown force alias ignored"),
            },
            None => {
                if let Some((kind, id)) = slash_alias(last_user).and_then(|a| self.resolve_alias(a))
                {
                    debug!(model = id, "slash-command force override");
                    return OverrideResult::forced(kind, id);
                }
            }
        }

        if let Some(parent_id) = request.parent_request_id {
            return self.inherit_from_parent(parent_id, log).await;
        }

        OverrideResult::none()
    }

    async fn inherit_from_parent(&self, parent_id: &str, log: &dyn RoutingLogStore) -> OverrideResult {
        match log.find_by_request_id(parent_id).await {
            Ok(Some(parent)) => {
                let (model_id, kind) = self.step_down(&parent.model_id);
                debug!(
                    parent = parent_id,
                    parent_model = %parent.model_id,
                    model = %model_id,
                    kind = %kind,
                    "sub-agent override"
                );
                OverrideResult::forced(kind, model_id)
            }
            Ok(None) => {
                // Expected when the parent's entry is still queued.
                warn!(parent = parent_id, "parent request not found in routing log");
                OverrideResult::none()
            }
            Err(e) => {
                warn!(parent = parent_id, error = %e, "parent lookup failed");
                OverrideResult::none()
            }
        }
    }

    /// One position cheaper than `model_id` in the hierarchy.
    ///
    /// Returns the same model with `SubAgentInherit` at the floor, and also
    /// for models missing from the hierarchy (those are treated as the floor).
    pub fn step_down(&self, model_id: &str) -> (String, OverrideKind) {
        match self.hierarchy.iter().position(|m| m == model_id) {
            Some(pos) if pos > 0 => (self.hierarchy[pos - 1].clone(), OverrideKind::SubAgentStepdown),
            Some(_) => (model_id.to_string(), OverrideKind::SubAgentInherit),
            None => {
                warn!(model = model_id, "model not in step-down hierarchy, inheriting unchanged");
                (model_id.to_string(), OverrideKind::SubAgentInherit)
            }
        }
    }
}
