//! Instrumented Provider
//!
//! Decorator that wraps any `LlmProvider`, logs each call and keeps running
//! totals. The counters can be shared by several wrapped providers so they
//! survive a model swap.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use agentloop_core::provider::{Completion, CompletionRequest, LlmProvider};
use agentloop_core::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};

/// Running totals across all calls through instrumented providers
#[derive(Debug, Default)]
pub struct ProviderMetrics {
    calls: AtomicU64,
    failures: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

/// Point-in-time copy of [`ProviderMetrics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub calls: u64,
    pub failures: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ProviderMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }
}

pub struct InstrumentedProvider {
    inner: Arc<dyn LlmProvider>,
    model: String,
    metrics: Arc<ProviderMetrics>,
}

impl InstrumentedProvider {
    pub fn new(
        inner: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        metrics: Arc<ProviderMetrics>,
    ) -> Self {
        Self {
            inner,
            model: model.into(),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<ProviderMetrics> {
        &self.metrics
    }
}

#[async_trait]
impl LlmProvider for InstrumentedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let span = info_span!("model_call", provider = self.inner.name(), model = %self.model);
        let started = Instant::now();

        let result = self.inner.complete(request).instrument(span.clone()).await;
        self.metrics.calls.fetch_add(1, Ordering::Relaxed);

        span.in_scope(|| match &result {
            Ok(completion) => {
                self.metrics
                    .input_tokens
                    .fetch_add(completion.usage.input_tokens, Ordering::Relaxed);
                self.metrics
                    .output_tokens
                    .fetch_add(completion.usage.output_tokens, Ordering::Relaxed);
                info!(
                    elapsed = ?started.elapsed(),
                    input_tokens = completion.usage.input_tokens,
                    output_tokens = completion.usage.output_tokens,
                    tool_calls = completion.tool_calls.len(),
                    "model call completed"
                );
            }
            Err(e) => {
                self.metrics.failures.fetch_add(1, Ordering::Relaxed);
                warn!(elapsed = ?started.elapsed(), error = %e, "model call failed");
            }
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloop_core::{AgentError, TokenUsage};

    struct Fixed(Option<Completion>);

    #[async_trait]
    impl LlmProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion> {
            self.0
                .clone()
                .ok_or_else(|| AgentError::Provider("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_counts_calls_tokens_and_failures() {
        let metrics = Arc::new(ProviderMetrics::default());
        let ok = InstrumentedProvider::new(
            Arc::new(Fixed(Some(Completion::text("hi").with_usage(TokenUsage::new(12, 3))))),
            "m1",
            metrics.clone(),
        );
        let down = InstrumentedProvider::new(Arc::new(Fixed(None)), "m2", metrics.clone());
        let request = CompletionRequest::new("sys", Vec::new());

        assert_eq!(ok.complete(&request).await.unwrap().content, "hi");
        ok.complete(&request).await.unwrap();
        assert!(down.complete(&request).await.is_err());

        assert_eq!(ok.name(), "fixed");
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot { calls: 3, failures: 1, input_tokens: 24, output_tokens: 6 }
        );
    }
}
