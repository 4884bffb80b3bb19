use axum::{
    extract::{Extension, State},
    response::Response,
};

use super::render;
use crate::{api::AppState, session::Session, views::EmptyPage};

// axum handler for the landing page
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    render(&state, &session, "landing", &EmptyPage {}).await
}
