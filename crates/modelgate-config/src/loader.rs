// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./modelgate.toml` > `~/.config/modelgate/modelgate.toml`
//! > `/etc/modelgate/modelgate.toml` with environment variable overrides via
//! the `MODELGATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ModelgateConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/modelgate/modelgate.toml` (system-wide)
/// 3. `~/.config/modelgate/modelgate.toml` (user XDG config)
/// 4. `./modelgate.toml` (local directory)
/// 5. `MODELGATE_*` environment variables
pub fn load_config() -> Result<ModelgateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<ModelgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ModelgateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ModelgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ModelgateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ModelgateConfig::default()))
        .merge(Toml::file("/etc/modelgate/modelgate.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("modelgate/modelgate.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("modelgate.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MODELGATE_PROVIDERS_OPENAI_API_KEY` must map to
/// `providers.openai.api_key`, and `MODELGATE_LOG_DATABASE_PATH` to
/// `log.database_path`.
fn env_provider() -> Env {
    const SECTIONS: &[&str] = &[
        "agent",
        "gateway",
        "classifier",
        "catalog",
        "overrides",
        "log",
        "proxy",
    ];

    // Figment hands `map` the key in its original case.
    Env::prefixed("MODELGATE_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        let key_str = key_str.as_str();
        let mapped = if let Some(rest) = key_str.strip_prefix("providers_") {
            match rest.split_once('_') {
                Some((provider, field)) => format!("providers.{provider}.{field}"),
                None => format!("providers.{rest}"),
            }
        } else if let Some(rest) = key_str.strip_prefix("classifier_weights_") {
            format!("classifier.weights.{rest}")
        } else {
            SECTIONS
                .iter()
                .find_map(|section| {
                    key_str
                        .strip_prefix(section)
                        .and_then(|rest| rest.strip_prefix('_'))
                        .map(|field| format!("{section}.{field}"))
                })
                .unwrap_or_else(|| key_str.to_string())
        };
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_provider_credentials() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODELGATE_PROVIDERS_OPENAI_API_KEY", "sk-test");
            jail.set_env("MODELGATE_GATEWAY_PORT", "9001");
            jail.set_env("MODELGATE_LOG_DATABASE_PATH", "/tmp/routing.db");
            let config = load_config().expect("env config should load");
            assert_eq!(config.providers.openai.api_key.as_deref(), Some("sk-test"));
            assert_eq!(config.gateway.port, 9001);
            assert_eq!(config.log.database_path.as_deref(), Some("/tmp/routing.db"));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_nested_weights_and_beat_the_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("modelgate.toml", "[gateway]\ndefault_mode = \"eco\"\n")?;
            jail.set_env("MODELGATE_GATEWAY_DEFAULT_MODE", "premium");
            jail.set_env("MODELGATE_CLASSIFIER_WEIGHTS_CODE_PRESENCE", "0.4");
            jail.set_env("MODELGATE_PROXY_STREAM_IDLE_TIMEOUT_SECS", "15");
            let config = load_config().expect("env config should load");
            assert_eq!(config.gateway.default_mode, "premium");
            assert!((config.classifier.weights.code_presence - 0.4).abs() < f64::EPSILON);
            assert_eq!(config.proxy.stream_idle_timeout_secs, 15);
            Ok(())
        });
    }

    #[test]
    fn local_file_is_merged_over_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "modelgate.toml",
                r#"
[gateway]
default_mode = "eco"

[classifier.weights]
code_presence = 0.5
"#,
            )?;
            let config = load_config().expect("file config should load");
            assert_eq!(config.gateway.default_mode, "eco");
            assert!((config.classifier.weights.code_presence - 0.5).abs() < f64::EPSILON);
            // Untouched weights keep their fallback values.
            assert!((config.classifier.weights.simple_indicators + 0.35).abs() < f64::EPSILON);
            Ok(())
        });
    }
}
