//! Cookie-addressed server-side sessions with a one-shot flash queue.
//!
//! A [`Session`] is loaded once per request by [`session_layer`] and shared
//! with handlers through request extensions. Changes only reach the store when
//! [`Sessions::save`] is called; the view composer does that on every render.
//! A save applies what this request changed to the stored entry, so
//! overlapping requests of one client do not overwrite each other.
//! The session cookie is written on every response whose session was saved.

pub mod store;

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use serde_json::Value;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;
use tracing::{debug, error};

pub use store::{MemorySessionStore, SessionStore};

pub const SESSION_COOKIE_NAME: &str = "cpanel_session";

/// Session key holding the authenticated username.
pub const SESSION_UID: &str = "uid";

const DEFAULT_SESSION_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to persist session: {0}")]
    Persistence(String),
    #[error("failed to generate session id")]
    IdGeneration(#[source] rand::Error),
}

/// Values and pending flash messages of one session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionData {
    pub values: HashMap<String, Value>,
    pub flashes: VecDeque<String>,
}

/// What one request did to a session since it was loaded or last saved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionChanges {
    /// Values set, last write per key.
    pub values: HashMap<String, Value>,
    /// Stored flash messages that were shown and must be dropped.
    pub taken_flashes: Vec<String>,
    /// Flash messages queued and not yet shown.
    pub added_flashes: Vec<String>,
}

impl SessionChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.taken_flashes.is_empty() && self.added_flashes.is_empty()
    }

    /// Merge the changes into `data`. Each taken message removes its first
    /// remaining occurrence; messages already gone are skipped.
    pub fn apply_to(&self, data: &mut SessionData) {
        for (key, value) in &self.values {
            data.values.insert(key.clone(), value.clone());
        }
        for taken in &self.taken_flashes {
            if let Some(position) = data.flashes.iter().position(|flash| flash == taken) {
                data.flashes.remove(position);
            }
        }
        data.flashes.extend(self.added_flashes.iter().cloned());
    }
}

struct SessionState {
    id: String,
    data: SessionData,
    changes: SessionChanges,
    /// Leading entries of `data.flashes` that are already in the store.
    stored_flashes: usize,
    dirty: bool,
    persisted: bool,
}

/// Handle to the current request's session.
///
/// Clones share the same state, so a value set by a handler is seen by the
/// middleware that later writes the cookie.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Session")
            .field("id", &"***")
            .field("values", &state.data.values.keys().collect::<Vec<_>>())
            .field("flashes", &state.data.flashes.len())
            .field("dirty", &state.dirty)
            .finish()
    }
}

impl Session {
    fn new(id: String, data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                id,
                stored_flashes: data.flashes.len(),
                data,
                changes: SessionChanges::default(),
                dirty: false,
                persisted: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn id(&self) -> String {
        self.state().id.clone()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state().data.values.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut state = self.state();
        state.data.values.insert(key.to_string(), value.clone());
        state.changes.values.insert(key.to_string(), value);
        state.dirty = true;
    }

    /// The authenticated username, if the `uid` value is a non-empty
    /// string or number.
    #[must_use]
    pub fn identity(&self) -> Option<String> {
        let uid = match self.get(SESSION_UID)? {
            Value::String(uid) => uid,
            Value::Number(uid) => uid.to_string(),
            _ => return None,
        };
        (!uid.is_empty()).then_some(uid)
    }

    /// Queue a message for the next render.
    pub fn add_flash(&self, message: impl Into<String>) {
        let message = message.into();
        let mut state = self.state();
        state.data.flashes.push_back(message.clone());
        state.changes.added_flashes.push(message);
        state.dirty = true;
    }

    /// Remove and return every pending flash message, oldest first.
    pub fn take_flashes(&self) -> Vec<String> {
        let mut state = self.state();
        if state.data.flashes.is_empty() {
            return Vec::new();
        }
        state.dirty = true;
        let flashes: Vec<String> = state.data.flashes.drain(..).collect();
        let stored = state.stored_flashes.min(flashes.len());
        state.changes.taken_flashes.extend_from_slice(&flashes[..stored]);
        // the rest were queued by this request and never stored
        state.changes.added_flashes.clear();
        state.stored_flashes = 0;
        flashes
    }

    /// Whether the session changed since it was loaded or last saved.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state().dirty
    }

    /// Whether the session was saved at least once during this request.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.state().persisted
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    ttl_seconds: u64,
    secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            secure_cookie: false,
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    #[must_use]
    pub fn secure_cookie(&self) -> bool {
        self.secure_cookie
    }
}

/// Loads sessions from request cookies and persists them into a store.
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve the request's session, starting a fresh one when the cookie is
    /// missing or points at an unknown id.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or a new id cannot be generated.
    pub fn get(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        if let Some(id) = extract_session_id(headers) {
            if let Some(data) = self.store.load(&id)? {
                return Ok(Session::new(id, data));
            }
            debug!("Unknown session cookie, starting a new session");
        }

        Ok(Session::new(generate_session_id()?, SessionData::default()))
    }

    /// Persist the session's pending changes, even when there are none, so
    /// the entry exists and its lifetime is renewed.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write. The changes are kept
    /// for the next attempt.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut state = session.state();
        self.store.save(&state.id, &state.changes)?;
        state.changes = SessionChanges::default();
        state.stored_flashes = state.data.flashes.len();
        state.dirty = false;
        state.persisted = true;
        Ok(())
    }

    /// Build the `Set-Cookie` value for `session`.
    ///
    /// # Errors
    /// Returns an error if the cookie is not a valid header value.
    pub fn cookie(&self, session: &Session) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            session.id(),
            self.config.ttl_seconds
        );
        if self.config.secure_cookie {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

/// Middleware: attach the [`Session`] to the request and write the cookie
/// back when the session was saved.
pub async fn session_layer(
    State(sessions): State<Arc<Sessions>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match sessions.get(request.headers()) {
        Ok(session) => session,
        Err(err) => {
            error!("Failed to load session: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if session.is_persisted() {
        match sessions.cookie(&session) {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(err) => error!("Failed to build session cookie: {err}"),
        }
    }

    response
}

fn generate_session_id() -> Result<String, SessionError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(SessionError::IdGeneration)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next().map(str::trim);
            let val = parts.next().map(str::trim);
            if let (Some(SESSION_COOKIE_NAME), Some(val)) = (key, val)
                && !val.is_empty()
            {
                return Some(val.to_string());
            }
        }
    }
    None
}
