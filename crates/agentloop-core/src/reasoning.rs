//! Reasoning Loop
//!
//! Drives one conversation turn: ask the backend, run any tools it requests,
//! feed the results back, and stop on a final answer or the iteration bound.
//!
//! The backend lives in a lock-guarded slot. Every backend call holds the
//! shared side of the lock and [`Agent::switch_model`] takes the exclusive
//! side, so a swap never interleaves with an in-flight call and every call
//! that starts after a swap sees the new backend.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::executor::ToolExecutor;
use crate::message::Message;
use crate::provider::{Completion, CompletionRequest, LlmProvider};
use crate::session::Session;
use crate::tool::{Tool, ToolRegistry};

/// Default bound on backend calls per run
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Builds a backend from `(provider, model)`; used for hot swap.
pub type BackendFactory =
    Arc<dyn Fn(&str, &str) -> Result<Arc<dyn LlmProvider>> + Send + Sync>;

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt sent with every request
    pub system_prompt: String,

    /// Maximum backend calls per run before giving up
    pub max_iterations: usize,

    /// Output token cap forwarded to the backend
    pub max_tokens: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: None,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. \
Use the available tools when they help you answer. \
After receiving tool results, synthesize them into a helpful response. \
Be concise and accurate.";

struct Backend {
    provider: Arc<dyn LlmProvider>,
    display_name: String,
}

/// The main Agent struct
pub struct Agent {
    backend: RwLock<Backend>,
    tools: Arc<ToolRegistry>,
    executor: ToolExecutor,
    config: AgentConfig,
    factory: Option<BackendFactory>,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        display_name: impl Into<String>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            backend: RwLock::new(Backend {
                provider,
                display_name: display_name.into(),
            }),
            executor: ToolExecutor::new(tools.clone()),
            tools,
            config,
            factory: None,
        }
    }

    /// Enable [`Agent::switch_model`]
    #[must_use]
    pub fn with_backend_factory(mut self, factory: BackendFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Run the agent on one user message.
    ///
    /// Appends the user message, then loops up to `max_iterations` times.
    /// Tool failures are handed back to the model; backend failures,
    /// cancellation and exhaustion of the bound abort the run.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        session: &mut Session,
        input: &str,
    ) -> Result<String> {
        session.reset_run_stats();
        session.add_message(Message::user(input));

        for iteration in 0..self.config.max_iterations {
            if cancel.is_cancelled() {
                debug!(session = %session.id, iteration, "run cancelled");
                return Err(AgentError::Cancelled);
            }

            let request = CompletionRequest::new(
                self.config.system_prompt.clone(),
                session.messages().to_vec(),
            )
            .with_tools(self.tools.to_definitions())
            .with_max_tokens(self.config.max_tokens);

            let completion = self.complete(&request, iteration).await?;
            session.add_token_usage(completion.usage);

            if !completion.has_tool_calls() {
                if !completion.content.is_empty() {
                    session.add_message(Message::assistant(completion.content.clone()));
                }
                debug!(session = %session.id, iterations = iteration + 1, "final answer");
                return Ok(completion.content);
            }

            let Completion { content, tool_calls, .. } = completion;
            session.add_message(Message::assistant_with_tools(content, tool_calls.clone()));

            let results = match self.executor.execute_batch(cancel, &tool_calls).await {
                Ok(results) => results,
                Err(AgentError::AllToolsFailed { results }) => {
                    warn!(
                        session = %session.id,
                        iteration,
                        calls = results.len(),
                        "every tool call in the batch failed"
                    );
                    results
                }
                Err(e) => return Err(e),
            };

            session.add_messages(ToolExecutor::results_to_messages(&results));
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Run against a fresh, throwaway session
    pub async fn ask(&self, cancel: &CancellationToken, question: &str) -> Result<String> {
        let mut session = Session::new();
        self.run(cancel, &mut session, question).await
    }

    /// Replace the backend with one built by the factory.
    ///
    /// The factory runs before the lock is taken; the swap itself waits for
    /// any in-flight backend call to finish. On any error the current
    /// backend stays in place.
    pub async fn switch_model(&self, provider: &str, model: &str, display_name: &str) -> Result<()> {
        let factory = self.factory.as_ref().ok_or(AgentError::SwapNotConfigured)?;
        let next = factory(provider, model)?;

        let mut backend = self.backend.write().await;
        let previous = std::mem::replace(&mut backend.display_name, display_name.to_string());
        backend.provider = next;

        info!(from = %previous, to = %display_name, provider, model, "switched model backend");
        Ok(())
    }

    /// Display name of the active backend
    pub async fn current_model_name(&self) -> String {
        self.backend.read().await.display_name.clone()
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn complete(&self, request: &CompletionRequest, iteration: usize) -> Result<Completion> {
        let backend = self.backend.read().await;
        debug!(
            iteration,
            provider = backend.provider.name(),
            model = %backend.display_name,
            messages = request.messages.len(),
            "calling model backend"
        );
        backend.provider.complete(request).await
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    display_name: Option<String>,
    tools: ToolRegistry,
    config: AgentConfig,
    factory: Option<BackendFactory>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            display_name: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
            factory: None,
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn max_tokens(mut self, max: Option<u32>) -> Self {
        self.config.max_tokens = max;
        self
    }

    #[must_use]
    pub fn backend_factory(mut self, factory: BackendFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        let display_name = self
            .display_name
            .unwrap_or_else(|| provider.name().to_string());

        let mut agent = Agent::new(provider, display_name, Arc::new(self.tools), self.config);
        agent.factory = self.factory;
        Ok(agent)
    }
}
