pub mod dashboard;
pub mod health;
pub mod home;
pub mod login;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use super::AppState;
use crate::session::Session;

/// Render `key` into an HTML response.
///
/// Render failures never take the process down: they are logged and turned
/// into a `500`.
pub(crate) async fn render<T: Serialize>(
    state: &AppState,
    session: &Session,
    key: &str,
    page: &T,
) -> Response {
    match state.views.render(session, key, page).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            let cause = std::error::Error::source(&err).map(ToString::to_string);
            if err.is_resolution() {
                error!(view = key, cause = ?cause, "Failed to resolve view: {err}");
            } else {
                error!(view = key, cause = ?cause, "Failed to render view: {err}");
            }
            internal_error()
        }
    }
}

pub(crate) fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
