// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for modelgate.

use thiserror::Error;

use crate::types::Provider;

/// The primary error type used across all modelgate crates.
///
/// Variants fall into four classes: configuration (`Config`), availability
/// (`UnknownModel`, `NoProvidersConfigured`), upstream (`Upstream`,
/// `Transport`, `Timeout`), and internal plumbing (`Storage`, `Internal`).
/// Configuration and availability errors are raised before any vendor is
/// contacted.
#[derive(Debug, Error)]
pub enum ModelgateError {
    /// Configuration errors (missing routing-table cell, malformed catalog).
    #[error("configuration error: {0}")]
    Config(String),

    /// A model id was requested that the registry does not know.
    #[error("unknown model id `{id}`")]
    UnknownModel { id: String },

    /// No provider in the registry has a credential or base URL configured.
    #[error("no providers configured")]
    NoProvidersConfigured,

    /// The vendor answered with a non-2xx status.
    #[error("{provider} returned HTTP {status}: {body}")]
    Upstream {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// The vendor could not be reached or its body could not be read.
    #[error("{provider} transport error: {message}")]
    Transport {
        provider: Provider,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Routing log backend errors.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ModelgateError {
    /// HTTP status reported by the vendor, for upstream errors only.
    pub fn status(&self) -> Option<u16> {
        match self {
            ModelgateError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for errors raised locally before any vendor was contacted.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ModelgateError::Config(_)
                | ModelgateError::UnknownModel { .. }
                | ModelgateError::NoProvidersConfigured
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_carries_status() {
        let err = ModelgateError::Upstream {
            provider: Provider::OpenAi,
            status: 429,
            body: "{\"error\":\"slow down\"}".into(),
        };
        assert_eq!(err.status(), Some(429));
        assert!(!err.is_local());
        let msg = err.to_string();
        assert!(msg.contains("429"), "got: {msg}");
        assert!(msg.contains("slow down"), "got: {msg}");
    }

    #[test]
    fn local_errors_have_no_status() {
        let errors = [
            ModelgateError::Config("missing cell".into()),
            ModelgateError::UnknownModel { id: "nope".into() },
            ModelgateError::NoProvidersConfigured,
        ];
        for err in &errors {
            assert!(err.is_local(), "{err} should be local");
            assert_eq!(err.status(), None);
        }
    }

    #[test]
    fn unknown_model_names_the_id() {
        let err = ModelgateError::UnknownModel {
            id: "gpt-17".into(),
        };
        assert!(err.to_string().contains("gpt-17"));
    }
}
