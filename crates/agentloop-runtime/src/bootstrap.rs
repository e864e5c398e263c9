//! Agent assembly from configuration

use std::sync::Arc;

use agentloop_core::{Agent, AgentBuilder, Session, SessionManager, ToolRegistry};
use tracing::info;

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::factory::ProviderFactory;

/// Build an agent whose initial backend and hot-swap hook both come from
/// `factory`.
pub fn build_agent(
    config: &RuntimeConfig,
    factory: &Arc<ProviderFactory>,
    tools: ToolRegistry,
) -> Result<Agent> {
    config.validate()?;

    let provider = factory.build(&config.provider, &config.model)?;
    let agent_config = config.agent_config();

    let agent = AgentBuilder::new()
        .provider(provider)
        .display_name(config.display_name())
        .tools(tools)
        .system_prompt(agent_config.system_prompt)
        .max_iterations(agent_config.max_iterations)
        .max_tokens(agent_config.max_tokens)
        .backend_factory(factory.backend_factory())
        .build()?;

    info!(
        provider = %config.provider,
        model = %config.model,
        tools = agent.tools().len(),
        max_iterations = config.max_iterations,
        "agent initialized"
    );
    Ok(agent)
}

/// A fresh session bounded by the configured history limit
pub fn new_session(config: &RuntimeConfig) -> Session {
    let mut session = Session::new();
    session.set_max_messages(config.max_messages);
    session
}

/// A session manager using the configured history limit
pub fn session_manager(config: &RuntimeConfig) -> SessionManager {
    SessionManager::new(config.max_messages)
}
