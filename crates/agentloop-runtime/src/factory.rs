//! Provider Factory
//!
//! Maps provider names to constructors so the agent can build a backend by
//! `(provider, model)` at startup and again on every model switch.

use std::collections::HashMap;
use std::sync::Arc;

use agentloop_core::{BackendFactory, LlmProvider};
use tracing::debug;

use crate::error::{Result, RuntimeError};
use crate::instrument::{InstrumentedProvider, ProviderMetrics};

/// Builds a provider for a model name
pub type ProviderConstructor =
    Arc<dyn Fn(&str) -> anyhow::Result<Arc<dyn LlmProvider>> + Send + Sync>;

pub struct ProviderFactory {
    constructors: HashMap<String, ProviderConstructor>,
    instrument: bool,
    metrics: Arc<ProviderMetrics>,
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory {
    /// Empty factory; built providers are wrapped in `InstrumentedProvider`
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
            instrument: true,
            metrics: Arc::new(ProviderMetrics::default()),
        }
    }

    /// Hand out providers exactly as their constructors return them
    #[must_use]
    pub const fn without_instrumentation(mut self) -> Self {
        self.instrument = false;
        self
    }

    /// Register a constructor. Replaces any previous one for this name.
    pub fn register<F>(&mut self, provider: impl Into<String>, constructor: F)
    where
        F: Fn(&str) -> anyhow::Result<Arc<dyn LlmProvider>> + Send + Sync + 'static,
    {
        self.constructors.insert(provider.into(), Arc::new(constructor));
    }

    /// Build a provider for `model`
    pub fn build(&self, provider: &str, model: &str) -> Result<Arc<dyn LlmProvider>> {
        let constructor = self
            .constructors
            .get(provider)
            .ok_or_else(|| RuntimeError::UnknownProvider(provider.to_string()))?;

        let built = constructor(model).map_err(|e| RuntimeError::ProviderBuild {
            provider: provider.to_string(),
            source: e.into(),
        })?;
        debug!(provider, model, "built model backend");

        if self.instrument {
            Ok(Arc::new(InstrumentedProvider::new(built, model, self.metrics.clone())))
        } else {
            Ok(built)
        }
    }

    /// Registered provider names, sorted
    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Counters shared by every instrumented provider this factory builds
    pub fn metrics(&self) -> Arc<ProviderMetrics> {
        self.metrics.clone()
    }

    /// Adapt into the agent's hot-swap hook
    pub fn backend_factory(self: &Arc<Self>) -> BackendFactory {
        let factory = Arc::clone(self);
        Arc::new(move |provider: &str, model: &str| {
            factory.build(provider, model).map_err(Into::into)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloop_core::provider::{Completion, CompletionRequest};
    use agentloop_core::AgentError;
    use async_trait::async_trait;

    struct Named {
        name: String,
        model: String,
    }

    #[async_trait]
    impl LlmProvider for Named {
        fn name(&self) -> &str {
            &self.name
        }

        async fn complete(&self, _request: &CompletionRequest) -> agentloop_core::Result<Completion> {
            Ok(Completion::text(format!("{} via {}", self.model, self.name)))
        }
    }

    fn factory() -> ProviderFactory {
        let mut factory = ProviderFactory::new();
        factory.register("local", |model: &str| {
            Ok(Arc::new(Named { name: "local".into(), model: model.into() }) as Arc<dyn LlmProvider>)
        });
        factory.register("broken", |_: &str| anyhow::bail!("missing API key"));
        factory
    }

    #[tokio::test]
    async fn test_build_and_instrument() {
        let factory = factory();
        let provider = factory.build("local", "tiny").unwrap();
        assert_eq!(provider.name(), "local");

        let completion = provider
            .complete(&CompletionRequest::new("", Vec::new()))
            .await
            .unwrap();
        assert_eq!(completion.content, "tiny via local");
        assert_eq!(factory.metrics().snapshot().calls, 1);
    }

    #[tokio::test]
    async fn test_without_instrumentation() {
        let factory = factory().without_instrumentation();
        let provider = factory.build("local", "tiny").unwrap();
        provider.complete(&CompletionRequest::new("", Vec::new())).await.unwrap();
        assert_eq!(factory.metrics().snapshot().calls, 0);
    }

    #[test]
    fn test_unknown_and_failing_providers() {
        let factory = factory();
        assert_eq!(factory.providers(), vec!["broken", "local"]);
        assert!(matches!(factory.build("cloud", "x"), Err(RuntimeError::UnknownProvider(_))));

        let err = factory.build("broken", "x").err().unwrap();
        assert!(err.to_string().contains("missing API key"));
    }

    #[test]
    fn test_backend_factory_maps_errors() {
        let hook = Arc::new(factory()).backend_factory();
        assert!(hook("local", "tiny").is_ok());
        assert!(matches!(hook("cloud", "x"), Err(AgentError::Config(_))));
        assert!(matches!(hook("broken", "x"), Err(AgentError::Provider(_))));
    }
}
