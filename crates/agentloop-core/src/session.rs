//! Session Management
//!
//! A session owns one conversation: its ordered message history, cumulative
//! token usage and the counters of the most recent run. Sessions live only in
//! process memory.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::TokenUsage;

/// Fewest messages a prune ever keeps
const MIN_RETAINED_MESSAGES: usize = 10;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counters for a single `Agent::run`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    /// Backend calls made during the run
    pub calls: u32,
}

/// A conversation with usage accounting
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    messages: Vec<Message>,

    /// Prune threshold; `None` or `0` disables pruning
    max_messages: Option<usize>,

    usage: TokenUsage,

    run_stats: RunStats,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new, empty, unbounded session
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    /// Create with specific ID
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            max_messages: None,
            usage: TokenUsage::default(),
            run_stats: RunStats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create with a maximum-message bound
    pub fn with_max_messages(max_messages: usize) -> Self {
        let mut session = Self::new();
        session.max_messages = Some(max_messages);
        session
    }

    /// Append one message, pruning if the bound is exceeded.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.prune();
        self.touch();
    }

    /// Append a batch in order. The bound is applied once, after the whole
    /// batch has landed.
    pub fn add_messages(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
        self.prune();
        self.touch();
    }

    /// Drop all history. Usage counters are kept.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.touch();
    }

    /// Zero the per-run counters
    pub fn reset_run_stats(&mut self) {
        self.run_stats = RunStats::default();
    }

    /// Record usage from one backend call
    pub fn add_token_usage(&mut self, usage: TokenUsage) {
        self.run_stats.input_tokens = self.run_stats.input_tokens.saturating_add(usage.input_tokens);
        self.run_stats.output_tokens =
            self.run_stats.output_tokens.saturating_add(usage.output_tokens);
        self.run_stats.total_tokens = self.run_stats.total_tokens.saturating_add(usage.total_tokens);
        self.run_stats.calls = self.run_stats.calls.saturating_add(1);
        self.usage += usage;
    }

    /// Conversation history, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Usage over the session's whole lifetime
    pub const fn cumulative_usage(&self) -> TokenUsage {
        self.usage
    }

    /// Usage of the most recent run
    pub const fn run_stats(&self) -> RunStats {
        self.run_stats
    }

    pub const fn max_messages(&self) -> Option<usize> {
        self.max_messages
    }

    /// Change the bound. Takes effect on the next append.
    pub fn set_max_messages(&mut self, max_messages: Option<usize>) {
        self.max_messages = max_messages;
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // Oldest messages go first; tool-call/tool-result pairs may be split.
    fn prune(&mut self) {
        let Some(bound) = self.max_messages.filter(|b| *b > 0) else {
            return;
        };
        if self.messages.len() <= bound {
            return;
        }

        let keep = (bound / 2).max(MIN_RETAINED_MESSAGES);
        let excess = self.messages.len().saturating_sub(keep);
        if excess > 0 {
            self.messages.drain(..excess);
            debug!(
                session = %self.id,
                dropped = excess,
                kept = self.messages.len(),
                "pruned session history"
            );
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a session; the mutex makes each session single-writer.
pub type SharedSession = Arc<Mutex<Session>>;

/// In-memory session manager
///
/// Hands sessions out behind an async mutex so concurrent callers cannot
/// run the same conversation twice at once. Nothing is persisted.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
    default_max_messages: Option<usize>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionManager {
    /// New manager; sessions it creates get `default_max_messages` as bound
    pub fn new(default_max_messages: Option<usize>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_max_messages,
        }
    }

    /// Create and store a fresh session
    pub fn create(&self) -> Result<(SessionId, SharedSession)> {
        let mut session = Session::new();
        session.set_max_messages(self.default_max_messages);
        let id = session.id.clone();
        let shared = Arc::new(Mutex::new(session));

        self.write()?.insert(id.clone(), shared.clone());
        debug!(session = %id, "created session");
        Ok((id, shared))
    }

    /// Look up a session by ID
    pub fn get(&self, id: &SessionId) -> Result<Option<SharedSession>> {
        Ok(self.read()?.get(id).cloned())
    }

    /// Look up a session, creating it under this ID if absent
    pub fn get_or_create(&self, id: &SessionId) -> Result<SharedSession> {
        let mut sessions = self.write()?;
        let shared = sessions
            .entry(id.clone())
            .or_insert_with(|| {
                let mut session = Session::with_id(id.clone());
                session.set_max_messages(self.default_max_messages);
                Arc::new(Mutex::new(session))
            })
            .clone();
        Ok(shared)
    }

    /// Forget a session. Returns it if it existed.
    pub fn remove(&self, id: &SessionId) -> Result<Option<SharedSession>> {
        Ok(self.write()?.remove(id))
    }

    /// IDs of all live sessions
    pub fn ids(&self) -> Result<Vec<SessionId>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<SessionId, SharedSession>>> {
        self.sessions
            .read()
            .map_err(|_| AgentError::Session("session map lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<SessionId, SharedSession>>> {
        self.sessions
            .write()
            .map_err(|_| AgentError::Session("session map lock poisoned".into()))
    }
}
