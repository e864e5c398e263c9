//! # agentloop-core
//!
//! Agentic loop runtime: a conversation session, a tool registry and
//! executor, and the orchestration loop that ties them to a pluggable,
//! hot-swappable model backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Agent                                │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │ ToolExecutor │  │ RwLock<LlmProvider> │  │
//! │  │    Loop     │──│ ToolRegistry │──│  (hot-swappable)    │  │
//! │  └─────────────┘  └──────────────┘  └─────────────────────┘  │
//! │         │                                                    │
//! │  ┌─────────────┐                                             │
//! │  │   Session   │  history + token usage                      │
//! │  └─────────────┘                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tool failures are returned to the model as conversation content; backend
//! failures, cancellation and the iteration bound end a run with an error.

pub mod builtin;
pub mod error;
pub mod executor;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use executor::ToolExecutor;
pub use message::{Message, Role};
pub use provider::{Completion, CompletionRequest, LlmProvider, TokenUsage};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, BackendFactory};
pub use session::{Session, SessionId, SessionManager};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
pub use tokio_util::sync::CancellationToken;
