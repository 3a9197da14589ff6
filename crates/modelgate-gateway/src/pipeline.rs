// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request control flow: classify, detect overrides, route, dispatch, log.
//!
//! Nothing here holds per-request state between calls. The only shared
//! mutable resource is the routing log, written through [`LogSender`] so the
//! response never waits on storage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::StreamExt;
use modelgate_config::ModelgateConfig;
use modelgate_core::{ChatMessage, ModelgateError, Role, RoutingLogEntry, RoutingLogStore};
use modelgate_log::{estimate_cost, fingerprint_messages, LogSender};
use modelgate_proxy::{
    translate_stream, Dispatcher, ProxyRequest, ProxyResponse, TokenUsage, TranslatedEvent,
    TranslatedStream,
};
use modelgate_router::{
    ClassificationResult, Classifier, ModelSpec, OverrideDetector, OverrideRequest, OverrideResult,
    RequestMeta, Router, RoutingDecision,
};
use tracing::{debug, info};

/// One inbound chat request, before routing.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Routing-table mode; the configured default when `None`.
    pub mode: Option<String>,
    /// Short alias forcing a model, e.g. `opus`.
    pub force: Option<String>,
    /// Request id of the parent when this request comes from a sub-agent.
    pub parent_request_id: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Everything decided before any vendor is contacted.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub request_id: String,
    pub classification: ClassificationResult,
    pub override_result: OverrideResult,
    pub decision: RoutingDecision,
    pub proxy_request: ProxyRequest,
    prompt_fingerprint: String,
}

impl RoutePlan {
    fn log_entry(&self, usage: TokenUsage, latency_ms: u64) -> RoutingLogEntry {
        let model: &ModelSpec = &self.decision.model;
        RoutingLogEntry {
            request_id: self.request_id.clone(),
            timestamp: Utc::now(),
            prompt_fingerprint: self.prompt_fingerprint.clone(),
            composite_score: self.classification.composite,
            tier: self.decision.tier,
            model_id: model.id.clone(),
            provider: model.provider,
            mode: self.decision.mode.clone(),
            override_kind: self.decision.override_kind,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            estimated_cost_usd: estimate_cost(model, usage.input_tokens, usage.output_tokens),
            latency_ms,
        }
    }
}

/// A completed non-streaming request.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub request_id: String,
    pub response: ProxyResponse,
    pub decision: RoutingDecision,
    pub estimated_cost_usd: f64,
}

/// A streaming request whose upstream headers arrived with a 2xx status.
pub struct StreamingReply {
    pub request_id: String,
    pub decision: RoutingDecision,
    /// Translated chunks. The log entry is submitted when `Done` passes through.
    pub events: TranslatedStream,
}

impl std::fmt::Debug for StreamingReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingReply")
            .field("request_id", &self.request_id)
            .field("decision", &self.decision)
            .finish_non_exhaustive()
    }
}

/// The request pipeline.
pub struct Pipeline {
    classifier: Classifier,
    detector: OverrideDetector,
    router: Router,
    dispatcher: Dispatcher,
    log: Arc<dyn RoutingLogStore>,
    writer: LogSender,
    default_mode: String,
    default_max_tokens: u32,
    stream_idle_timeout: Duration,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("default_mode", &self.default_mode)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Assemble a pipeline. Classifier weights, override tables, and
    /// defaults come from `config`.
    pub fn new(
        config: &ModelgateConfig,
        router: Router,
        dispatcher: Dispatcher,
        log: Arc<dyn RoutingLogStore>,
        writer: LogSender,
    ) -> Self {
        Self {
            classifier: Classifier::new(&config.classifier),
            detector: OverrideDetector::new(&config.overrides),
            router,
            dispatcher,
            log,
            writer,
            default_mode: config.gateway.default_mode.clone(),
            default_max_tokens: config.proxy.default_max_tokens,
            stream_idle_timeout: Duration::from_secs(config.proxy.stream_idle_timeout_secs),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn log(&self) -> &Arc<dyn RoutingLogStore> {
        &self.log
    }

    /// Classify, detect overrides, and route, without contacting a vendor.
    pub async fn plan(&self, request: ChatRequest) -> Result<RoutePlan, ModelgateError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let text = modelgate_core::last_user_message(&request.messages).unwrap_or_default();

        let system = system_text(&request.messages);
        let meta = RequestMeta {
            system_prompt: system.as_deref(),
            message_count: request.messages.len(),
        };
        let classification = self.classifier.classify(text, &meta);

        let override_result = self
            .detector
            .detect(
                &OverrideRequest {
                    messages: &request.messages,
                    force_alias: request.force.as_deref(),
                    parent_request_id: request.parent_request_id.as_deref(),
                },
                self.log.as_ref(),
            )
            .await;

        let mode = request.mode.as_deref().unwrap_or(&self.default_mode);
        let decision = self.router.route(&classification, mode, &override_result)?;
        info!(
            request_id = %request_id,
            model = %decision.model.id,
            tier = %decision.tier,
            mode = %decision.mode,
            override_kind = %decision.override_kind,
            composite = classification.composite,
            fell_back = decision.fell_back,
            "request routed"
        );

        let prompt_fingerprint = fingerprint_messages(&request.messages);
        let proxy_request = ProxyRequest {
            provider: decision.model.provider,
            model_id: decision.model.id.clone(),
            messages: request.messages,
            system: None,
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            temperature: request.temperature,
        };

        Ok(RoutePlan {
            request_id,
            classification,
            override_result,
            decision,
            proxy_request,
            prompt_fingerprint,
        })
    }

    /// Route and dispatch one blocking request, then queue its log entry.
    pub async fn complete(&self, request: ChatRequest) -> Result<GatewayReply, ModelgateError> {
        let plan = self.plan(request).await?;
        let response = self.dispatcher.dispatch(&plan.proxy_request).await?;

        let usage = TokenUsage {
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        };
        let entry = plan.log_entry(usage, response.latency_ms);
        let estimated_cost_usd = entry.estimated_cost_usd;
        self.writer.submit(entry);

        Ok(GatewayReply {
            request_id: plan.request_id,
            response,
            decision: plan.decision,
            estimated_cost_usd,
        })
    }

    /// Route and open a streaming request.
    ///
    /// Errors before the upstream headers arrive are returned directly. The
    /// log entry is queued only if the stream reaches its terminal event.
    pub async fn stream(&self, request: ChatRequest) -> Result<StreamingReply, ModelgateError> {
        let plan = self.plan(request).await?;
        let started = Instant::now();
        let handle = self.dispatcher.stream_dispatch(&plan.proxy_request).await?;
        let translated = translate_stream(handle, self.stream_idle_timeout);

        let request_id = plan.request_id.clone();
        let decision = plan.decision.clone();
        let writer = self.writer.clone();
        let mut pending = Some(plan);
        let events = translated.map(move |item| {
            if let Ok(TranslatedEvent::Done { usage }) = &item
                && let Some(plan) = pending.take()
            {
                let latency_ms = started.elapsed().as_millis() as u64;
                debug!(request_id = %plan.request_id, latency_ms, "stream completed");
                writer.submit(plan.log_entry(*usage, latency_ms));
            }
            item
        });

        Ok(StreamingReply {
            request_id,
            decision,
            events: Box::pin(events),
        })
    }
}

/// System-role turns joined, or `None` if there are none.
fn system_text(messages: &[ChatMessage]) -> Option<String> {
    let parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}
