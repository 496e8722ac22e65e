//! Per-session chat state.
//!
//! A [`SessionStore`] owns one [`Session`]: the display log, the
//! model-facing history, and the pending input buffer.  The three are
//! created together, cleared together, and never shared between sessions.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;

use crate::types::{DisplayMessage, ModelHistoryEntry};

/// Caller-supplied identity of a session, e.g. a connection id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new `SessionId`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The mutable state of one conversation.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) display: Vec<DisplayMessage>,
    pub(crate) history: Vec<ModelHistoryEntry>,
    pub(crate) pending: String,
    pub(crate) created_at: OffsetDateTime,
    // Bumped on every clear so in-flight turns can tell their session was reset.
    pub(crate) epoch: u64,
}

impl Session {
    fn new(epoch: u64) -> Self {
        Self {
            display: Vec::new(),
            history: Vec::new(),
            pending: String::new(),
            created_at: OffsetDateTime::now_utc(),
            epoch,
        }
    }
}

/// A point-in-time copy of a session, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// The UI-facing transcript.
    pub display: Vec<DisplayMessage>,
    /// The model-facing history.
    pub history: Vec<ModelHistoryEntry>,
    /// The text currently in the input box.
    pub pending: String,
    /// When the session was created or last cleared.
    pub created_at: OffsetDateTime,
}

/// Owner of one session's state.
///
/// Every mutation happens under one lock, so readers never observe a
/// half-applied append or reset.  A separate turn lock admits at most one
/// round trip at a time.
pub struct SessionStore {
    id: SessionId,
    state: Mutex<Option<Session>>,
    turn: tokio::sync::Mutex<()>,
}

impl SessionStore {
    /// Creates a store with no session yet; call [`SessionStore::init`].
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(None),
            turn: tokio::sync::Mutex::new(()),
        }
    }

    /// The identity this store was created for.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Creates the session if it does not exist yet.
    ///
    /// Returns true when a session was created.  Calling it again is a no-op,
    /// so a re-render can call it unconditionally.
    pub fn init(&self) -> bool {
        let mut state = self.lock();
        if state.is_some() {
            return false;
        }
        *state = Some(Session::new(0));
        true
    }

    /// Returns true once [`SessionStore::init`] has run.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Resets the display log, history and pending input to empty.
    pub fn clear(&self) {
        let mut state = self.lock();
        let epoch = state.as_ref().map(|s| s.epoch + 1).unwrap_or(0);
        *state = Some(Session::new(epoch));
    }

    /// The UI-facing transcript.
    pub fn get_display(&self) -> Vec<DisplayMessage> {
        self.lock()
            .as_ref()
            .map(|s| s.display.clone())
            .unwrap_or_default()
    }

    /// The model-facing history.
    pub fn get_history(&self) -> Vec<ModelHistoryEntry> {
        self.lock()
            .as_ref()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// The not yet submitted input text.
    pub fn get_pending(&self) -> String {
        self.lock()
            .as_ref()
            .map(|s| s.pending.clone())
            .unwrap_or_default()
    }

    /// Replaces the pending input text, creating the session if needed.
    pub fn set_pending(&self, text: impl Into<String>) {
        let text = text.into();
        self.with_session(|session| session.pending = text);
    }

    /// A consistent copy of all three containers.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        match state.as_ref() {
            Some(session) => SessionSnapshot {
                display: session.display.clone(),
                history: session.history.clone(),
                pending: session.pending.clone(),
                created_at: session.created_at,
            },
            None => SessionSnapshot {
                display: Vec::new(),
                history: Vec::new(),
                pending: String::new(),
                created_at: OffsetDateTime::now_utc(),
            },
        }
    }

    /// Runs `f` on the session under the state lock, creating it if needed.
    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut state = self.lock();
        let session = state.get_or_insert_with(|| Session::new(0));
        f(session)
    }

    /// Claims the turn lock, or returns None while another turn is running.
    pub(crate) fn try_begin_turn(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        self.turn.try_lock().ok()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("id", &self.id)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Sessions keyed by caller-supplied identity.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<SessionStore>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store for `id`, creating and initialising it on first use.
    pub fn get_or_init(&self, id: impl Into<SessionId>) -> Arc<SessionStore> {
        let id = id.into();
        let mut sessions = self.lock();
        let store = sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(SessionStore::new(id)))
            .clone();
        store.init();
        store
    }

    /// Returns the store for `id` if it exists.
    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionStore>> {
        self.lock().get(id).cloned()
    }

    /// Tears down the session for `id`.  Returns true if it existed.
    pub fn end(&self, id: &SessionId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Returns true if a session exists for `id`.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no session is live.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<SessionStore>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> SessionStore {
        let store = SessionStore::new("test");
        store.init();
        store.with_session(|s| {
            s.display.push(DisplayMessage::user("hi"));
            s.history.push(ModelHistoryEntry::user("hi"));
            s.pending = "draft".to_string();
        });
        store
    }

    #[test]
    fn new_store_is_empty() {
        let store = SessionStore::new("fresh");
        assert!(!store.is_initialized());
        assert!(store.get_display().is_empty());
        assert!(store.get_history().is_empty());
        assert_eq!(store.get_pending(), "");
    }

    #[test]
    fn init_is_idempotent() {
        let store = populated();
        assert!(!store.init());
        assert!(!store.init());
        assert_eq!(store.get_display(), vec![DisplayMessage::user("hi")]);
        assert_eq!(store.get_history(), vec![ModelHistoryEntry::user("hi")]);
        assert_eq!(store.get_pending(), "draft");
    }

    #[test]
    fn clear_resets_everything() {
        let store = populated();
        let epoch = store.with_session(|s| s.epoch);
        store.clear();
        let snapshot = store.snapshot();
        assert!(snapshot.display.is_empty());
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.pending, "");
        assert_eq!(store.with_session(|s| s.epoch), epoch + 1);
    }

    #[test]
    fn clear_before_init_creates_empty_session() {
        let store = SessionStore::new("early");
        store.clear();
        assert!(store.is_initialized());
        assert!(store.get_display().is_empty());
    }

    #[test]
    fn set_pending_roundtrip() {
        let store = SessionStore::new("typing");
        store.set_pending("What does motor.run do?");
        assert_eq!(store.get_pending(), "What does motor.run do?");
    }

    #[test]
    fn turn_lock_is_exclusive() {
        let store = SessionStore::new("turns");
        let first = store.try_begin_turn();
        assert!(first.is_some());
        assert!(store.try_begin_turn().is_none());
        drop(first);
        assert!(store.try_begin_turn().is_some());
    }

    #[test]
    fn registry_sessions_are_independent() {
        let registry = SessionRegistry::new();
        let a = registry.get_or_init("a");
        let b = registry.get_or_init("b");
        a.set_pending("only in a");
        assert_eq!(b.get_pending(), "");
        assert_eq!(registry.len(), 2);

        let again = registry.get_or_init("a");
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(again.get_pending(), "only in a");

        assert!(registry.end(&SessionId::from("a")));
        assert!(!registry.contains(&SessionId::from("a")));
        assert!(!registry.end(&SessionId::from("a")));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&SessionId::from("b")).is_some());
    }
}
