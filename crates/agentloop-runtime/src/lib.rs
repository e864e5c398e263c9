//! # agentloop-runtime
//!
//! Wiring around `agentloop-core`: configuration, tracing, provider
//! construction and instrumentation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agentloop_runtime::{ProviderFactory, RuntimeConfig, bootstrap, telemetry};
//!
//! let config = RuntimeConfig::from_env()?;
//! telemetry::init_tracing(&config.log_filter)?;
//!
//! let mut factory = ProviderFactory::new();
//! factory.register("ollama", |model| Ok(Arc::new(MyOllama::new(model)) as Arc<dyn LlmProvider>));
//! let factory = Arc::new(factory);
//!
//! let agent = bootstrap::build_agent(&config, &factory, tools)?;
//! let mut session = bootstrap::new_session(&config);
//! let answer = agent.run(&CancellationToken::new(), &mut session, "Hello").await?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod factory;
pub mod instrument;
pub mod telemetry;

pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use factory::ProviderFactory;
pub use instrument::{InstrumentedProvider, MetricsSnapshot, ProviderMetrics};

// Re-export core types for convenience
pub use agentloop_core::{
    Agent, AgentError, CancellationToken, LlmProvider, Message, Role, Session, Tool, ToolRegistry,
};
