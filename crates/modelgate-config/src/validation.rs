// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as threshold ordering, non-empty model ids, and non-zero timeouts.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::ModelgateConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &ModelgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let classifier = &config.classifier;
    for (name, value) in [
        ("simple_max", classifier.simple_max),
        ("complex_min", classifier.complex_min),
    ] {
        if !(0.0..=1.0).contains(&value) {
            fail(format!("classifier.{name} must be within [0, 1], got {value}"));
        }
    }
    if classifier.simple_max >= classifier.complex_min {
        fail(format!(
            "classifier.simple_max ({}) must be below classifier.complex_min ({})",
            classifier.simple_max, classifier.complex_min
        ));
    }

    let w = &classifier.weights;
    let weights = [
        w.token_count,
        w.code_presence,
        w.reasoning_markers,
        w.simple_indicators,
        w.multi_step,
        w.question_complexity,
        w.system_prompt_complexity,
        w.conversation_depth,
    ];
    if weights.iter().any(|v| !v.is_finite()) {
        fail("classifier.weights must all be finite numbers".to_string());
    }

    if config.gateway.host.trim().is_empty() {
        fail("gateway.host must not be empty".to_string());
    }
    if config.gateway.default_mode.trim().is_empty() {
        fail("gateway.default_mode must not be empty".to_string());
    }

    if config.overrides.heartbeat_model.trim().is_empty() {
        fail("overrides.heartbeat_model must not be empty".to_string());
    }
    for (alias, id) in &config.overrides.aliases {
        if alias.trim().is_empty() || id.trim().is_empty() {
            fail(format!(
                "overrides.aliases entry `{alias}` = `{id}` must have a non-empty alias and model id"
            ));
        }
    }
    let mut seen = HashSet::new();
    for id in &config.overrides.hierarchy {
        if !seen.insert(id.as_str()) {
            fail(format!("duplicate model `{id}` in overrides.hierarchy"));
        }
    }

    if config.log.queue_capacity == 0 {
        fail("log.queue_capacity must be at least 1".to_string());
    }
    if config.log.stats_window_hours == 0 {
        fail("log.stats_window_hours must be at least 1".to_string());
    }
    if let Some(path) = &config.log.database_path
        && path.trim().is_empty()
    {
        fail("log.database_path must not be empty when set".to_string());
    }

    let proxy = &config.proxy;
    for (name, secs) in [
        ("request_timeout_secs", proxy.request_timeout_secs),
        ("connect_timeout_secs", proxy.connect_timeout_secs),
        ("stream_idle_timeout_secs", proxy.stream_idle_timeout_secs),
    ] {
        if secs == 0 {
            fail(format!("proxy.{name} must be at least 1"));
        }
    }
    if proxy.default_max_tokens == 0 {
        fail("proxy.default_max_tokens must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        let config = ModelgateConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn inverted_thresholds_fail_validation() {
        let mut config = ModelgateConfig::default();
        config.classifier.simple_max = 0.5;
        config.classifier.complex_min = 0.4;
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("must be below")));
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let mut config = ModelgateConfig::default();
        config.classifier.complex_min = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("complex_min must be within")));
    }

    #[test]
    fn duplicate_hierarchy_entry_fails_validation() {
        let mut config = ModelgateConfig::default();
        config.overrides.hierarchy = vec!["a".into(), "b".into(), "a".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("duplicate model `a`")));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ModelgateConfig::default();
        config.overrides.heartbeat_model = " ".into();
        config.log.queue_capacity = 0;
        config.proxy.connect_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "got: {:?}", messages(&errors));
    }
}
