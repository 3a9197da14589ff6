// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for modelgate.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use modelgate_core::Provider;
use serde::{Deserialize, Serialize};

/// Top-level modelgate configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelgateConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Per-provider credentials and endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Heuristic classifier weights and tier thresholds.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Model catalog and routing table sources.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Override detector tables.
    #[serde(default)]
    pub overrides: OverridesConfig,

    /// Routing log settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Upstream call settings.
    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind the gateway to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the gateway to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Routing mode used when a request does not name one.
    #[serde(default = "default_mode")]
    pub default_mode: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_mode: default_mode(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8402
}

fn default_mode() -> String {
    "standard".to_string()
}

/// Credential and endpoint for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API credential forwarded to the vendor. `None` leaves the provider unconfigured.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Endpoint override. `None` uses the vendor's public endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Credential, if present and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Base URL, if present and non-blank.
    pub fn endpoint(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Per-provider settings, one table per vendor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub anthropic: ProviderConfig,
    #[serde(default)]
    pub google: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub xai: ProviderConfig,
    #[serde(default)]
    pub deepseek: ProviderConfig,
    #[serde(default)]
    pub openrouter: ProviderConfig,
    #[serde(default = "default_ollama")]
    pub ollama: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            anthropic: ProviderConfig::default(),
            google: ProviderConfig::default(),
            openai: ProviderConfig::default(),
            xai: ProviderConfig::default(),
            deepseek: ProviderConfig::default(),
            openrouter: ProviderConfig::default(),
            ollama: default_ollama(),
        }
    }
}

impl ProvidersConfig {
    /// Settings for one provider.
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Anthropic => &self.anthropic,
            Provider::Google => &self.google,
            Provider::OpenAi => &self.openai,
            Provider::Xai => &self.xai,
            Provider::DeepSeek => &self.deepseek,
            Provider::OpenRouter => &self.openrouter,
            Provider::Ollama => &self.ollama,
        }
    }

    /// Mutable settings for one provider.
    pub fn get_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::Anthropic => &mut self.anthropic,
            Provider::Google => &mut self.google,
            Provider::OpenAi => &mut self.openai,
            Provider::Xai => &mut self.xai,
            Provider::DeepSeek => &mut self.deepseek,
            Provider::OpenRouter => &mut self.openrouter,
            Provider::Ollama => &mut self.ollama,
        }
    }
}

fn default_ollama() -> ProviderConfig {
    ProviderConfig {
        api_key: None,
        base_url: Some("http://localhost:11434/v1".to_string()),
    }
}

/// Weight applied to each of the eight classifier dimensions.
///
/// The defaults are the fallback set used when no weights are configured.
/// `simple_indicators` is negative so casual messages pull the composite down.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionWeights {
    #[serde(default = "w_token_count")]
    pub token_count: f64,
    #[serde(default = "w_code_presence")]
    pub code_presence: f64,
    #[serde(default = "w_reasoning_markers")]
    pub reasoning_markers: f64,
    #[serde(default = "w_simple_indicators")]
    pub simple_indicators: f64,
    #[serde(default = "w_multi_step")]
    pub multi_step: f64,
    #[serde(default = "w_question_complexity")]
    pub question_complexity: f64,
    #[serde(default = "w_system_prompt_complexity")]
    pub system_prompt_complexity: f64,
    #[serde(default = "w_conversation_depth")]
    pub conversation_depth: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            token_count: w_token_count(),
            code_presence: w_code_presence(),
            reasoning_markers: w_reasoning_markers(),
            simple_indicators: w_simple_indicators(),
            multi_step: w_multi_step(),
            question_complexity: w_question_complexity(),
            system_prompt_complexity: w_system_prompt_complexity(),
            conversation_depth: w_conversation_depth(),
        }
    }
}

fn w_token_count() -> f64 {
    0.15
}

fn w_code_presence() -> f64 {
    0.30
}

fn w_reasoning_markers() -> f64 {
    0.25
}

fn w_simple_indicators() -> f64 {
    -0.35
}

fn w_multi_step() -> f64 {
    0.25
}

fn w_question_complexity() -> f64 {
    0.10
}

fn w_system_prompt_complexity() -> f64 {
    0.10
}

fn w_conversation_depth() -> f64 {
    0.10
}

/// Classifier weights and tier thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Composite scores at or below this are `simple`.
    #[serde(default = "default_simple_max")]
    pub simple_max: f64,

    /// Composite scores at or above this are `complex`.
    #[serde(default = "default_complex_min")]
    pub complex_min: f64,

    #[serde(default)]
    pub weights: DimensionWeights,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            simple_max: default_simple_max(),
            complex_min: default_complex_min(),
            weights: DimensionWeights::default(),
        }
    }
}

fn default_simple_max() -> f64 {
    0.15
}

fn default_complex_min() -> f64 {
    0.35
}

/// Sources for the model catalog and routing table.
///
/// Paths are read once at startup. `None` selects the built-in JSON.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    #[serde(default)]
    pub models_path: Option<String>,

    #[serde(default)]
    pub routing_table_path: Option<String>,
}

/// Tables consulted by the override detector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OverridesConfig {
    /// Model forced for heartbeat and summary shortcuts.
    #[serde(default = "default_heartbeat_model")]
    pub heartbeat_model: String,

    /// Short alias -> model id, used by explicit and slash-command forcing.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,

    /// Step-down hierarchy, cheapest first.
    #[serde(default = "default_hierarchy")]
    pub hierarchy: Vec<String>,
}

impl Default for OverridesConfig {
    fn default() -> Self {
        Self {
            heartbeat_model: default_heartbeat_model(),
            aliases: default_aliases(),
            hierarchy: default_hierarchy(),
        }
    }
}

fn default_heartbeat_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_aliases() -> BTreeMap<String, String> {
    [
        ("opus", "claude-opus-4-1-20250805"),
        ("sonnet", "claude-sonnet-4-5-20250929"),
        ("haiku", "claude-haiku-4-5-20251001"),
        ("flash", "gemini-2.5-flash"),
        ("pro", "gemini-2.5-pro"),
        ("gpt", "gpt-4.1"),
        ("mini", "gpt-4o-mini"),
        ("grok", "grok-4"),
        ("deepseek", "deepseek-chat"),
        ("r1", "deepseek-reasoner"),
        ("local", "llama3.1:8b"),
    ]
    .into_iter()
    .map(|(alias, id)| (alias.to_string(), id.to_string()))
    .collect()
}

fn default_hierarchy() -> Vec<String> {
    [
        "llama3.1:8b",
        "gemini-2.5-flash-lite",
        "gpt-4o-mini",
        "deepseek-chat",
        "gemini-2.5-flash",
        "claude-haiku-4-5-20251001",
        "gemini-2.5-pro",
        "claude-sonnet-4-5-20250929",
        "claude-opus-4-1-20250805",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Routing log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// SQLite database for the routing log. `None` keeps the log in memory.
    #[serde(default)]
    pub database_path: Option<String>,

    /// Entries buffered between request handlers and the log writer.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Model used as the "always the priciest" savings baseline.
    /// `None` picks the catalog model with the highest output price.
    #[serde(default)]
    pub baseline_model: Option<String>,

    /// Lookback window for stats, in hours.
    #[serde(default = "default_stats_window_hours")]
    pub stats_window_hours: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            queue_capacity: default_queue_capacity(),
            baseline_model: None,
            stats_window_hours: default_stats_window_hours(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_stats_window_hours() -> u64 {
    24 * 7
}

/// Upstream call configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Whole-request timeout for non-streaming calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TCP/TLS connect timeout.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum silence between stream chunks before the stream errors.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,

    /// Max tokens used when a request does not specify one.
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// `anthropic-version` header value.
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
            default_max_tokens: default_max_tokens(),
            anthropic_version: default_anthropic_version(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_stream_idle_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}
