use axum::{
    extract::{Extension, State},
    response::Response,
};
use serde::Serialize;

use super::render;
use crate::{api::AppState, session::Session};

pub const DASHBOARD_VIEW: &str = "layout:cp_dashboard";

#[derive(Serialize)]
struct DashboardPage {
    active: &'static str,
}

/// Protected control panel landing. Only reached through `require_auth`.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    render(
        &state,
        &session,
        DASHBOARD_VIEW,
        &DashboardPage {
            active: "dashboard",
        },
    )
    .await
}
