// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy key suggestions.
//!
//! Turns Figment extraction failures into miette diagnostics that point at
//! the offending key in the TOML source and suggest the closest valid key
//! (Jaro-Winkler similarity).

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(modelgate::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(modelgate::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(modelgate::config::missing_key),
        help("add `{key} = <value>` to your modelgate.toml")
    )]
    MissingKey { key: String },

    /// A semantic validation failure.
    #[error("validation error: {message}")]
    #[diagnostic(code(modelgate::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(modelgate::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
///
/// `toml_sources` holds `(path, contents)` pairs used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let suggestion = suggest_key(field, expected);
                    let (span, src) = source_of(&error, toml_sources)
                        .and_then(|(path, content)| {
                            find_key_offset(content, &section, field).map(|offset| {
                                (
                                    Some(SourceSpan::new(offset.into(), field.len())),
                                    Some(NamedSource::new(path, content.to_string())),
                                )
                            })
                        })
                        .unwrap_or((None, None));
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion,
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: field.clone().into_owned(),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: section.join("."),
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.to_string(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// The TOML file an error came from, if it is one of `toml_sources`.
fn source_of<'a>(
    error: &figment::error::Error,
    toml_sources: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let origin = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => path.display().to_string(),
        _ => return None,
    };
    toml_sources
        .iter()
        .find(|(path, _)| *path == origin)
        .map(|(path, content)| (path.as_str(), content.as_str()))
}

/// Byte offset of `field` inside the table named by `section`.
///
/// `section = ["classifier", "weights"]` searches after the
/// `[classifier.weights]` header; an empty section searches from the start.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let start = if section.is_empty() {
        0
    } else {
        let header = format!("[{}]", section.join("."));
        content.find(&header)? + header.len()
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && offset != start {
            // Next table reached without finding the key.
            return None;
        }
        if let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best valid key above the similarity threshold, if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_simple_mx_for_simple_max() {
        let valid = &["simple_max", "complex_min", "weights"];
        assert_eq!(suggest_key("simple_mx", valid), Some("simple_max".to_string()));
    }

    #[test]
    fn suggest_api_kye_for_api_key() {
        let valid = &["api_key", "base_url"];
        assert_eq!(suggest_key("api_kye", valid), Some("api_key".to_string()));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["host", "port", "default_mode"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_nested_table() {
        let content = "[classifier]\nsimple_max = 0.1\n\n[classifier.weights]\ncode_presnce = 0.3\n";
        let section = vec!["classifier".to_string(), "weights".to_string()];
        let o = find_key_offset(content, &section, "code_presnce").unwrap();
        assert_eq!(&content[o..o + 12], "code_presnce");
    }

    #[test]
    fn find_key_offset_stops_at_next_table() {
        let content = "[gateway]\nport = 1\n\n[proxy]\nprot = 2\n";
        let section = vec!["gateway".to_string()];
        assert_eq!(find_key_offset(content, &section, "prot"), None);
    }
}
