// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider dispatch.
//!
//! A lookup table keyed by provider selects the wire adapter; adding a
//! provider that speaks an existing dialect is one table entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use modelgate_config::model::{ProxyConfig, ProvidersConfig};
use modelgate_core::{ModelgateError, Provider, WireFormat};
use tracing::{debug, info};

use crate::adapter::{CallContext, WireAdapter};
use crate::anthropic::{self, NativeAdapter};
use crate::gemini::{self, AltVendorAdapter};
use crate::openai::{self, OpenAiCompatibleAdapter};
use crate::types::{ProxyRequest, ProxyResponse, StreamHandle};

/// Endpoint and credential for one provider.
#[derive(Clone, Default)]
pub struct ProviderTarget {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTarget")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn default_base_url(provider: Provider) -> Option<&'static str> {
    match provider.wire_format() {
        WireFormat::Native => Some(anthropic::DEFAULT_BASE_URL),
        WireFormat::AltVendor => Some(gemini::DEFAULT_BASE_URL),
        WireFormat::OpenAiCompatible => openai::default_base_url(provider),
    }
}

/// Sends provider-agnostic requests to the right vendor.
#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    adapters: HashMap<Provider, Arc<dyn WireAdapter>>,
    targets: HashMap<Provider, ProviderTarget>,
    request_timeout: Duration,
    idle_timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("providers", &self.adapters.keys().collect::<Vec<_>>())
            .field("targets", &self.targets)
            .field("request_timeout", &self.request_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

impl Dispatcher {
    /// Build a dispatcher with all three adapters registered.
    pub fn new(providers: &ProvidersConfig, proxy: &ProxyConfig) -> Result<Self, ModelgateError> {
        let idle_timeout = Duration::from_secs(proxy.stream_idle_timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(proxy.connect_timeout_secs))
            .read_timeout(idle_timeout)
            .user_agent(concat!("modelgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ModelgateError::Internal(format!("failed to build HTTP client: {e}")))?;

        let native: Arc<dyn WireAdapter> = Arc::new(NativeAdapter::new(&proxy.anthropic_version));
        let alt_vendor: Arc<dyn WireAdapter> = Arc::new(AltVendorAdapter);
        let openai_compatible: Arc<dyn WireAdapter> = Arc::new(OpenAiCompatibleAdapter);

        let mut adapters = HashMap::new();
        let mut targets = HashMap::new();
        for provider in Provider::ALL {
            let adapter = match provider.wire_format() {
                WireFormat::Native => &native,
                WireFormat::AltVendor => &alt_vendor,
                WireFormat::OpenAiCompatible => &openai_compatible,
            };
            adapters.insert(provider, Arc::clone(adapter));

            let entry = providers.get(provider);
            targets.insert(
                provider,
                ProviderTarget {
                    base_url: entry.endpoint().map(String::from),
                    api_key: entry.credential().map(String::from),
                },
            );
        }

        Ok(Self {
            client,
            adapters,
            targets,
            request_timeout: Duration::from_secs(proxy.request_timeout_secs),
            idle_timeout,
        })
    }

    /// Replace the adapter used for one provider.
    pub fn register(&mut self, provider: Provider, adapter: Arc<dyn WireAdapter>) {
        self.adapters.insert(provider, adapter);
    }

    /// Point one provider at a different endpoint.
    pub fn with_target(mut self, provider: Provider, target: ProviderTarget) -> Self {
        self.targets.insert(provider, target);
        self
    }

    fn context(
        &self,
        provider: Provider,
        streaming: bool,
    ) -> Result<(CallContext<'_>, &dyn WireAdapter), ModelgateError> {
        let adapter = self
            .adapters
            .get(&provider)
            .ok_or_else(|| ModelgateError::Config(format!("no wire adapter registered for {provider}")))?;
        let target = self.targets.get(&provider);
        let base_url = target
            .and_then(|t| t.base_url.as_deref())
            .or_else(|| default_base_url(provider))
            .ok_or_else(|| ModelgateError::Config(format!("no base URL configured for {provider}")))?;
        let ctx = CallContext {
            client: &self.client,
            provider,
            base_url: base_url.trim_end_matches('/'),
            api_key: target.and_then(|t| t.api_key.as_deref()),
            request_timeout: self.request_timeout,
            idle_timeout: self.idle_timeout,
            streaming,
        };
        Ok((ctx, adapter.as_ref()))
    }

    /// Blocking dispatch. Non-2xx responses become [`ModelgateError::Upstream`];
    /// nothing is retried.
    pub async fn dispatch(&self, request: &ProxyRequest) -> Result<ProxyResponse, ModelgateError> {
        let (ctx, adapter) = self.context(request.provider, false)?;
        let started = Instant::now();
        debug!(
            provider = %request.provider,
            model = %request.model_id,
            format = %adapter.format(),
            "dispatching"
        );

        let completion = adapter.complete(&ctx, request).await?;
        let latency_ms = started.elapsed().as_millis() as u64;
        info!(
            provider = %request.provider,
            model = %request.model_id,
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            latency_ms,
            "upstream call completed"
        );

        Ok(ProxyResponse {
            content: completion.content,
            input_tokens: completion.usage.input_tokens,
            output_tokens: completion.usage.output_tokens,
            model_id: request.model_id.clone(),
            provider: request.provider,
            latency_ms,
            finish_reason: completion.finish_reason,
        })
    }

    /// Streaming dispatch. Returns the raw upstream response once headers
    /// arrive with a 2xx status; decoding is left to the caller.
    pub async fn stream_dispatch(&self, request: &ProxyRequest) -> Result<StreamHandle, ModelgateError> {
        let (ctx, adapter) = self.context(request.provider, true)?;
        let started_at = Instant::now();
        debug!(
            provider = %request.provider,
            model = %request.model_id,
            format = %adapter.format(),
            "opening stream"
        );
        let response = adapter.open_stream(&ctx, request).await?;
        Ok(StreamHandle {
            response,
            model_id: request.model_id.clone(),
            provider: request.provider,
            started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_has_an_adapter_for_its_format() {
        let dispatcher =
            Dispatcher::new(&ProvidersConfig::default(), &ProxyConfig::default()).unwrap();
        for provider in Provider::ALL {
            let adapter = &dispatcher.adapters[&provider];
            assert_eq!(adapter.format(), provider.wire_format());
        }
    }

    #[test]
    fn configured_base_url_overrides_default() {
        let mut providers = ProvidersConfig::default();
        providers.openai.base_url = Some("http://gateway.local/v1/".into());
        let dispatcher = Dispatcher::new(&providers, &ProxyConfig::default()).unwrap();
        let (ctx, _) = dispatcher.context(Provider::OpenAi, false).unwrap();
        assert_eq!(ctx.base_url, "http://gateway.local/v1");
        assert!(ctx.api_key.is_none());

        let (ctx, _) = dispatcher.context(Provider::Anthropic, false).unwrap();
        assert_eq!(ctx.base_url, anthropic::DEFAULT_BASE_URL);
    }

    #[test]
    fn streaming_context_reports_the_idle_timeout() {
        let proxy = ProxyConfig {
            request_timeout_secs: 120,
            stream_idle_timeout_secs: 7,
            ..ProxyConfig::default()
        };
        let dispatcher = Dispatcher::new(&ProvidersConfig::default(), &proxy).unwrap();
        let (streaming, _) = dispatcher.context(Provider::OpenAi, true).unwrap();
        assert_eq!(streaming.effective_timeout(), Duration::from_secs(7));
        let (blocking, _) = dispatcher.context(Provider::OpenAi, false).unwrap();
        assert_eq!(blocking.effective_timeout(), Duration::from_secs(7));

        let proxy = ProxyConfig {
            request_timeout_secs: 3,
            ..proxy
        };
        let dispatcher = Dispatcher::new(&ProvidersConfig::default(), &proxy).unwrap();
        let (blocking, _) = dispatcher.context(Provider::OpenAi, false).unwrap();
        assert_eq!(blocking.effective_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn local_provider_without_url_is_a_config_error() {
        let mut providers = ProvidersConfig::default();
        providers.ollama.base_url = None;
        let dispatcher = Dispatcher::new(&providers, &ProxyConfig::default()).unwrap();
        let err = match dispatcher.context(Provider::Ollama, false) {
            Err(e) => e,
            Ok(_) => panic!("ollama without a base URL should not resolve"),
        };
        assert!(matches!(err, ModelgateError::Config(_)));
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let target = ProviderTarget {
            base_url: None,
            api_key: Some("sk-secret".into()),
        };
        let rendered = format!("{target:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
