//! Session persistence backends.

use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};

use super::{SessionChanges, SessionData, SessionError};

/// Storage for session data keyed by session id.
pub trait SessionStore: Send + Sync {
    /// Load the data for `id`, or `None` when the id is unknown or expired.
    fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError>;

    /// Apply `changes` to the entry for `id`, starting from an empty session
    /// when there is none. The merge must be atomic per entry.
    fn save(&self, id: &str, changes: &SessionChanges) -> Result<(), SessionError>;
}

struct StoredSession {
    data: SessionData,
    saved_at: Instant,
}

/// Process-local session store.
///
/// Entries older than `ttl` are ignored on load and pruned on save.
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live entries, expired ones included until the next save.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().map_or(0, |sessions| sessions.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SessionError::Persistence("session store lock poisoned".to_string()))?;

        Ok(sessions
            .get(id)
            .filter(|stored| stored.saved_at.elapsed() < self.ttl)
            .map(|stored| stored.data.clone()))
    }

    fn save(&self, id: &str, changes: &SessionChanges) -> Result<(), SessionError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::Persistence("session store lock poisoned".to_string()))?;

        sessions.retain(|_, stored| stored.saved_at.elapsed() < self.ttl);
        let stored = sessions
            .entry(id.to_string())
            .or_insert_with(|| StoredSession {
                data: SessionData::default(),
                saved_at: Instant::now(),
            });
        changes.apply_to(&mut stored.data);
        stored.saved_at = Instant::now();

        Ok(())
    }
}
