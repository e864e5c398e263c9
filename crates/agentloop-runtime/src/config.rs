//! Runtime Configuration
//!
//! Settings come from defaults overridden by `AGENTLOOP_*` environment
//! variables (a `.env` file is loaded first when present).

use std::str::FromStr;

use agentloop_core::AgentConfig;
use agentloop_core::reasoning::DEFAULT_MAX_ITERATIONS;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

const ENV_PROVIDER: &str = "AGENTLOOP_PROVIDER";
const ENV_MODEL: &str = "AGENTLOOP_MODEL";
const ENV_DISPLAY_NAME: &str = "AGENTLOOP_DISPLAY_NAME";
const ENV_SYSTEM_PROMPT: &str = "AGENTLOOP_SYSTEM_PROMPT";
const ENV_MAX_ITERATIONS: &str = "AGENTLOOP_MAX_ITERATIONS";
const ENV_MAX_MESSAGES: &str = "AGENTLOOP_MAX_MESSAGES";
const ENV_MAX_TOKENS: &str = "AGENTLOOP_MAX_TOKENS";
const ENV_LOG: &str = "AGENTLOOP_LOG";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Provider name resolved through the `ProviderFactory`
    pub provider: String,

    /// Model identifier passed to the provider constructor
    pub model: String,

    /// Name shown to users; defaults to `provider/model`
    pub display_name: Option<String>,

    /// Overrides the agent's default system prompt
    pub system_prompt: Option<String>,

    pub max_iterations: usize,

    /// Session history bound; `None` keeps everything
    pub max_messages: Option<usize>,

    pub max_tokens: Option<u32>,

    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            model: "llama3.2".into(),
            display_name: None,
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_messages: Some(100),
            max_tokens: None,
            log_filter: "info".into(),
        }
    }
}

impl RuntimeConfig {
    /// Load from the process environment (after reading `.env`, if any)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from defaults plus whatever `lookup` returns for each key
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(provider) = lookup(ENV_PROVIDER) {
            config.provider = provider;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            config.model = model;
        }
        if let Some(name) = lookup(ENV_DISPLAY_NAME) {
            config.display_name = Some(name);
        }
        if let Some(prompt) = lookup(ENV_SYSTEM_PROMPT) {
            config.system_prompt = Some(prompt);
        }
        if let Some(raw) = lookup(ENV_MAX_ITERATIONS) {
            config.max_iterations = parse(ENV_MAX_ITERATIONS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_MESSAGES) {
            let bound: usize = parse(ENV_MAX_MESSAGES, &raw)?;
            config.max_messages = (bound > 0).then_some(bound);
        }
        if let Some(raw) = lookup(ENV_MAX_TOKENS) {
            config.max_tokens = Some(parse(ENV_MAX_TOKENS, &raw)?);
        }
        if let Some(filter) = lookup(ENV_LOG) {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(RuntimeError::Config("provider must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(RuntimeError::Config("model must not be empty".into()));
        }
        if self.max_iterations == 0 {
            return Err(RuntimeError::Config("max_iterations must be at least 1".into()));
        }
        Ok(())
    }

    pub fn display_name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.provider, self.model))
    }

    /// The agent-level part of this configuration
    pub fn agent_config(&self) -> AgentConfig {
        let mut agent = AgentConfig {
            max_iterations: self.max_iterations,
            max_tokens: self.max_tokens,
            ..AgentConfig::default()
        };
        if let Some(prompt) = &self.system_prompt {
            agent.system_prompt.clone_from(prompt);
        }
        agent
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| RuntimeError::InvalidConfig {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.display_name(), "ollama/llama3.2");
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (ENV_PROVIDER, "anthropic"),
            (ENV_MODEL, "claude-sonnet"),
            (ENV_DISPLAY_NAME, "Sonnet"),
            (ENV_MAX_ITERATIONS, "4"),
            (ENV_MAX_MESSAGES, "0"),
            (ENV_MAX_TOKENS, " 1024 "),
            (ENV_SYSTEM_PROMPT, "Be terse."),
        ]))
        .unwrap();

        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.display_name(), "Sonnet");
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.max_messages, None);
        assert_eq!(config.max_tokens, Some(1024));

        let agent = config.agent_config();
        assert_eq!(agent.system_prompt, "Be terse.");
        assert_eq!(agent.max_iterations, 4);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = RuntimeConfig::from_lookup(lookup_from(&[(ENV_MAX_ITERATIONS, "ten")]))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConfig { key, .. } if key == ENV_MAX_ITERATIONS));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = RuntimeConfig::from_lookup(lookup_from(&[(ENV_MAX_ITERATIONS, "0")]))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }
}
