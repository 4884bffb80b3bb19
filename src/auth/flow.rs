//! Login submission pipeline: parse, look up, verify, establish.
//!
//! Each stage either hands its result to the next one or stops the pipeline
//! with a [`LoginError`]. Only a digest match touches the session.

use axum::extract::rejection::FormRejection;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use super::credentials::{hash_password, verify};
use crate::{
    dao::{DaoError, User, UserDao},
    i18n::Localizer,
    session::{SESSION_UID, Session, SessionError, Sessions},
};

/// Submitted login form. Missing fields are treated as empty.
#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("cannot parse login form: {0}")]
    FormParse(String),
    #[error("credential lookup failed")]
    Lookup(#[source] DaoError),
    #[error("user {0} not found")]
    NotFound(String),
    #[error("credential mismatch for user {0}")]
    Mismatch(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl LoginError {
    /// Message shown on the re-rendered login page.
    #[must_use]
    pub fn localized(&self, i18n: &dyn Localizer) -> String {
        match self {
            Self::FormParse(reason) => i18n.text("error_form_400", &[reason.as_str()]),
            Self::Lookup(err) => i18n.text("error_db_001", &[err.to_string().as_str()]),
            Self::NotFound(username) => i18n.text("error_user_not_found", &[username.as_str()]),
            Self::Mismatch(_) => i18n.text("error_login_failed", &[]),
            Self::Session(err) => err.to_string(),
        }
    }

    /// Whether the login page should be shown again. Session persistence
    /// failures are server errors instead.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Session(_))
    }

    /// Whether the submitted username can be echoed back into the form.
    #[must_use]
    pub fn keeps_form(&self) -> bool {
        !matches!(self, Self::FormParse(_))
    }
}

pub struct LoginFlow {
    users: Arc<dyn UserDao>,
    sessions: Arc<Sessions>,
    localizer: Arc<dyn Localizer>,
}

impl LoginFlow {
    pub fn new(
        users: Arc<dyn UserDao>,
        sessions: Arc<Sessions>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            users,
            sessions,
            localizer,
        }
    }

    /// Run the whole submission against `session`.
    ///
    /// On success the session carries the username as its identity, a
    /// welcome flash is queued, and the session has been saved.
    ///
    /// # Errors
    /// Returns the first stage that failed.
    #[instrument(skip(self, session, form))]
    pub async fn submit(
        &self,
        session: &Session,
        form: Result<LoginForm, FormRejection>,
    ) -> Result<User, LoginError> {
        let form = parse(form)?;
        let user = self.authenticate(&form).await?;
        self.establish(session, &user)?;
        Ok(user)
    }

    /// Look up `form.username` and compare digests.
    ///
    /// # Errors
    /// Returns [`LoginError::Lookup`] on storage failure,
    /// [`LoginError::NotFound`] for unknown users and
    /// [`LoginError::Mismatch`] for a wrong password.
    pub async fn authenticate(&self, form: &LoginForm) -> Result<User, LoginError> {
        let user = self
            .users
            .get(&form.username)
            .await
            .map_err(LoginError::Lookup)?
            .ok_or_else(|| LoginError::NotFound(form.username.clone()))?;

        let candidate = hash_password(&user.username, &form.password);
        if !verify(&candidate, &user.password) {
            return Err(LoginError::Mismatch(user.username));
        }

        Ok(user)
    }

    fn establish(&self, session: &Session, user: &User) -> Result<(), LoginError> {
        session.set(SESSION_UID, user.username.as_str());
        session.add_flash(self.localizer.text("login_successful", &[user.username.as_str()]));
        self.sessions.save(session)?;
        debug!(uid = %user.username, "Login successful");
        Ok(())
    }
}

fn parse(form: Result<LoginForm, FormRejection>) -> Result<LoginForm, LoginError> {
    form.map_err(|rejection| LoginError::FormParse(rejection.body_text()))
}
