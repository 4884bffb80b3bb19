use axum::{
    Form,
    extract::{Extension, State, rejection::FormRejection},
    response::Response,
};
use serde::Serialize;
use tracing::{debug, error};

use super::{internal_error, render};
use crate::{
    api::{
        AppState,
        routes::{RouteName, found},
    },
    auth::LoginForm,
    session::Session,
};

pub const LOGIN_VIEW: &str = "login";

/// Values echoed back into the login form. The password never is.
#[derive(Serialize)]
struct StickyForm {
    username: String,
}

#[derive(Serialize, Default)]
struct LoginPage {
    form: Option<StickyForm>,
    error: Option<String>,
}

// axum handler for the empty login form
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    render(&state, &session, LOGIN_VIEW, &LoginPage::default()).await
}

/// Form submission. Every credential failure re-renders the form with a
/// `200`; only a persistence failure is a server error.
pub async fn submit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = form.map(|Form(form)| form);
    let username = form.as_ref().ok().map(|form| form.username.clone());

    match state.login.submit(&session, form).await {
        Ok(user) => {
            debug!(uid = %user.username, "Redirecting to dashboard");
            found(RouteName::CpDashboard.path())
        }
        Err(err) if err.is_recoverable() => {
            debug!("Login rejected: {err}");
            let page = LoginPage {
                form: username
                    .filter(|_| err.keeps_form())
                    .map(|username| StickyForm { username }),
                error: Some(err.localized(state.localizer.as_ref())),
            };
            render(&state, &session, LOGIN_VIEW, &page).await
        }
        Err(err) => {
            error!("Failed to establish session: {err}");
            internal_error()
        }
    }
}
