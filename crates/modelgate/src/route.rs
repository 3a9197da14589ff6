// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `modelgate route`: show where a prompt would go, without calling a vendor.

use modelgate_config::ModelgateConfig;
use modelgate_core::{ChatMessage, ModelgateError};
use modelgate_gateway::{ChatRequest, RoutePlan};

use crate::bootstrap::{build_runtime, LogBackend};

/// Options for a dry-run routing decision.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub text: String,
    pub system: Option<String>,
    pub mode: Option<String>,
    pub force: Option<String>,
}

/// Plan one request against an empty in-memory log.
pub async fn dry_run(config: &ModelgateConfig, options: RouteOptions) -> Result<RoutePlan, ModelgateError> {
    let runtime = build_runtime(config, LogBackend::Memory).await?;
    let mut messages = Vec::new();
    if let Some(system) = options.system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(options.text));

    runtime
        .pipeline
        .plan(ChatRequest {
            messages,
            mode: options.mode,
            force: options.force,
            ..ChatRequest::default()
        })
        .await
}

/// Human-readable report of a plan.
pub fn render_plan(plan: &RoutePlan) -> String {
    let decision = &plan.decision;
    let classification = &plan.classification;
    let mut out = String::new();
    out.push_str(&format!(
        "model:       {} ({})\n",
        decision.model.id, decision.model.provider
    ));
    out.push_str(&format!(
        "tier:        {} (composite {:.3})\n",
        decision.tier, classification.composite
    ));
    out.push_str(&format!("mode:        {}\n", decision.mode));
    out.push_str(&format!("override:    {}\n", decision.override_kind));
    out.push_str(&format!("reason:      {}\n", decision.justification));
    out.push_str("dimensions:\n");
    for (name, score) in classification.scores.named() {
        out.push_str(&format!("  {name:<26} {score:.3}\n"));
    }
    out
}

/// Runs the `modelgate route` command.
pub async fn run_route(config: ModelgateConfig, options: RouteOptions) -> Result<(), ModelgateError> {
    let plan = dry_run(&config, options).await?;
    print!("{}", render_plan(&plan));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelgate_core::{ComplexityTier, OverrideKind};

    #[tokio::test]
    async fn greeting_is_simple_and_routed_locally() {
        // Defaults configure only the local provider.
        let plan = dry_run(
            &ModelgateConfig::default(),
            RouteOptions {
                text: "hi".into(),
                mode: Some("eco".into()),
                ..RouteOptions::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(plan.decision.tier, ComplexityTier::Simple);
        assert_eq!(plan.decision.model.id, "llama3.1:8b");

        let report = render_plan(&plan);
        assert!(report.contains("llama3.1:8b"));
        assert!(report.contains("simple_indicators"));
    }

    #[tokio::test]
    async fn forced_alias_shows_in_report() {
        let plan = dry_run(
            &ModelgateConfig::default(),
            RouteOptions {
                text: "hello".into(),
                force: Some("opus".into()),
                ..RouteOptions::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(plan.decision.override_kind, OverrideKind::ForceOpus);
        assert!(render_plan(&plan).contains("force_opus"));
    }
}
