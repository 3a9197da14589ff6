// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost estimation from catalog prices.

use modelgate_router::ModelSpec;

/// Estimated USD cost of one call.
///
/// `(input_tokens / 1M) * input_price + (output_tokens / 1M) * output_price`,
/// with prices taken from the catalog entry.
pub fn estimate_cost(spec: &ModelSpec, input_tokens: u32, output_tokens: u32) -> f64 {
    let input = f64::from(input_tokens) / 1_000_000.0 * spec.input_cost_per_mtok;
    let output = f64::from(output_tokens) / 1_000_000.0 * spec.output_cost_per_mtok;
    input + output
}
