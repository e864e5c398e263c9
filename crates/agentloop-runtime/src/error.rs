//! Runtime Errors

use agentloop_core::AgentError;
use thiserror::Error;

/// Result type alias for runtime wiring
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A configuration value could not be parsed
    #[error("Invalid value {value:?} for {key}")]
    InvalidConfig { key: String, value: String },

    /// Configuration parsed but is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// No constructor registered under this provider name
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// A provider constructor failed
    #[error("Failed to build provider '{provider}': {source}")]
    ProviderBuild {
        provider: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Tracing subscriber could not be installed
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl From<RuntimeError> for AgentError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Agent(inner) => inner,
            RuntimeError::ProviderBuild { .. } => Self::Provider(err.to_string()),
            other => Self::Config(other.to_string()),
        }
    }
}
