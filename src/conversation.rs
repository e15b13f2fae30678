//! In-memory conversation history
//!
//! Histories live only for the process lifetime. The persona turn is never
//! stored; it is prepended when a completion request is built.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

/// Session key used when histories are shared or no session is given
pub const DEFAULT_SESSION: &str = "default";

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion APIs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a conversation
///
/// Fields are private so a turn cannot change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ordered log of user and assistant turns
///
/// No role alternation is enforced; consecutive turns from the same role are
/// kept as-is. With `max_turns` set, the oldest turns are evicted first.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    max_turns: Option<usize>,
}

impl ConversationHistory {
    /// Create an empty, unbounded history
    #[must_use]
    pub const fn new() -> Self {
        Self {
            turns: Vec::new(),
            max_turns: None,
        }
    }

    /// Create an empty history that keeps at most `max_turns` turns
    #[must_use]
    pub const fn with_max_turns(max_turns: Option<usize>) -> Self {
        Self {
            turns: Vec::new(),
            max_turns,
        }
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);

        if let Some(max) = self.max_turns {
            let excess = self.turns.len().saturating_sub(max);
            if excess > 0 {
                self.turns.drain(..excess);
                tracing::debug!(evicted = excess, max, "history cap reached");
            }
        }
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Remove every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// How histories are shared between callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryScope {
    /// One history for the whole process (single-user companion)
    #[default]
    Shared,
    /// One history per caller-supplied session id
    Session,
}

impl HistoryScope {
    /// Parse from a config string, defaulting to `Shared`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "session" | "per-session" | "per_session" => Self::Session,
            _ => Self::Shared,
        }
    }
}

/// Shared handle to one session's history
pub type SharedHistory = Arc<Mutex<ConversationHistory>>;

/// Owner of every conversation history in the process
///
/// Each history sits behind its own mutex; a request holds it while it
/// records the user turn, generates, and records the reply, so concurrent
/// requests on the same session never interleave.
#[derive(Debug, Clone)]
pub struct SessionStore {
    scope: HistoryScope,
    max_turns: Option<usize>,
    sessions: Arc<RwLock<HashMap<String, SharedHistory>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(scope: HistoryScope, max_turns: Option<usize>) -> Self {
        Self {
            scope,
            max_turns,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[must_use]
    pub const fn scope(&self) -> HistoryScope {
        self.scope
    }

    /// Resolve the storage key for a caller-supplied session id
    fn key(&self, session_id: Option<&str>) -> String {
        match (self.scope, session_id) {
            (HistoryScope::Session, Some(id)) if !id.trim().is_empty() => id.trim().to_string(),
            _ => DEFAULT_SESSION.to_string(),
        }
    }

    /// Get the history for a session, creating it empty on first use
    ///
    /// Only the chat path creates histories; lookups go through
    /// [`Self::snapshot`] and [`Self::clear`], which never allocate.
    pub async fn history(&self, session_id: Option<&str>) -> SharedHistory {
        let key = self.key(session_id);

        if let Some(history) = self.sessions.read().await.get(&key) {
            return Arc::clone(history);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(key).or_insert_with(|| {
            Arc::new(Mutex::new(ConversationHistory::with_max_turns(self.max_turns)))
        }))
    }

    /// Existing history for a session, if any
    async fn existing(&self, session_id: Option<&str>) -> Option<SharedHistory> {
        let key = self.key(session_id);
        self.sessions.read().await.get(&key).map(Arc::clone)
    }

    /// Copy of a session's turns; unknown sessions are empty
    pub async fn snapshot(&self, session_id: Option<&str>) -> Vec<Turn> {
        let Some(history) = self.existing(session_id).await else {
            return Vec::new();
        };
        let guard = history.lock().await;
        guard.turns().to_vec()
    }

    /// Clear a session's history, returning how many turns were removed
    pub async fn clear(&self, session_id: Option<&str>) -> usize {
        let Some(history) = self.existing(session_id).await else {
            return 0;
        };
        let mut guard = history.lock().await;
        let removed = guard.len();
        guard.clear();
        removed
    }

    /// Number of histories currently held
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(HistoryScope::Shared, None)
    }
}
