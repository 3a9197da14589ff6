// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic request complexity classification.
//!
//! Combines the eight dimension scores into a weighted composite, clamps it
//! to `[0, 1]`, and buckets it into a tier. No I/O, no network.

use std::time::Instant;

use modelgate_config::model::{ClassifierConfig, DimensionWeights};
use modelgate_core::ComplexityTier;

use crate::dimensions::{DimensionScores, RequestMeta};

/// Result of classifying one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// The classified complexity tier.
    pub tier: ComplexityTier,
    /// Weighted composite, clamped to `[0, 1]`.
    pub composite: f64,
    /// Per-dimension scores before weighting.
    pub scores: DimensionScores,
    /// Wall-clock time spent classifying, in milliseconds.
    pub classified_in_ms: f64,
}

/// Bucket a composite score. Both boundaries are inclusive.
pub fn assign_tier(composite: f64, simple_max: f64, complex_min: f64) -> ComplexityTier {
    if composite <= simple_max {
        ComplexityTier::Simple
    } else if composite >= complex_min {
        ComplexityTier::Complex
    } else {
        ComplexityTier::Standard
    }
}

/// Weighted-sum classifier with externally supplied weights and thresholds.
#[derive(Debug, Clone)]
pub struct Classifier {
    weights: DimensionWeights,
    simple_max: f64,
    complex_min: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self::with_weights(config.weights, config.simple_max, config.complex_min)
    }

    pub fn with_weights(weights: DimensionWeights, simple_max: f64, complex_min: f64) -> Self {
        Self {
            weights,
            simple_max,
            complex_min,
        }
    }

    /// Classify `text` (normally the last user message).
    pub fn classify(&self, text: &str, meta: &RequestMeta<'_>) -> ClassificationResult {
        let started = Instant::now();
        let scores = DimensionScores::score(text, meta);
        let raw = scores.weighted_sum(&self.weights);
        let composite = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
        let tier = assign_tier(composite, self.simple_max, self.complex_min);

        ClassificationResult {
            tier,
            composite,
            scores,
            classified_in_ms: started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classify(text: &str) -> ClassificationResult {
        Classifier::default().classify(
            text,
            &RequestMeta {
                system_prompt: None,
                message_count: 1,
            },
        )
    }

    #[test]
    fn greeting_is_simple() {
        let result = classify("hi");
        assert_eq!(result.scores.simple_indicators, 1.0);
        assert_eq!(result.tier, ComplexityTier::Simple);
        assert!(result.composite <= 0.15);
    }

    #[test]
    fn code_and_refactoring_is_complex_even_when_short() {
        let text = "Please refactor these:\n\
                    ```rust\nfn a() {}\n```\n\
                    ```rust\nfn b() {}\n```\n\
                    ```rust\nfn c() {}\n```\n\
                    and refactor the tests too.";
        let result = classify(text);
        assert!(result.scores.code_presence >= 0.8);
        assert!(result.scores.multi_step >= 0.6);
        assert_eq!(result.tier, ComplexityTier::Complex, "composite {}", result.composite);
    }

    #[test]
    fn moderate_question_is_standard() {
        let text = "Could you explain why HTTP caching headers behave differently behind a CDN? \
                    What are the trade-offs of short max-age values?";
        let result = classify(text);
        assert_eq!(result.tier, ComplexityTier::Standard, "composite {}", result.composite);
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        assert_eq!(assign_tier(0.15, 0.15, 0.35), ComplexityTier::Simple);
        assert_eq!(assign_tier(0.35, 0.15, 0.35), ComplexityTier::Complex);
        assert_eq!(assign_tier(0.2, 0.15, 0.35), ComplexityTier::Standard);
    }

    #[test]
    fn classification_is_fast() {
        // Warm the lazily compiled patterns first.
        classify("warm up");
        let text = "word ".repeat(2000);
        let result = classify(&text);
        assert!(result.classified_in_ms < 50.0, "took {}ms", result.classified_in_ms);
    }

    proptest! {
        #[test]
        fn composite_is_clamped_for_any_weights(
            text in ".{0,200}",
            w in proptest::array::uniform8(-10.0f64..10.0),
        ) {
            let weights = DimensionWeights {
                token_count: w[0],
                code_presence: w[1],
                reasoning_markers: w[2],
                simple_indicators: w[3],
                multi_step: w[4],
                question_complexity: w[5],
                system_prompt_complexity: w[6],
                conversation_depth: w[7],
            };
            let classifier = Classifier::with_weights(weights, 0.15, 0.35);
            let result = classifier.classify(&text, &RequestMeta { system_prompt: None, message_count: 4 });
            prop_assert!((0.0..=1.0).contains(&result.composite));
            prop_assert_eq!(result.tier, assign_tier(result.composite, 0.15, 0.35));
        }
    }
}
