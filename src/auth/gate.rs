//! Session guard for protected routes.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{
    api::routes::{RouteName, found},
    session::Session,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Authenticated(String),
}

impl AuthStatus {
    #[must_use]
    pub fn of(session: &Session) -> Self {
        session
            .identity()
            .map_or(Self::Anonymous, Self::Authenticated)
    }
}

/// Middleware: run the wrapped handler for authenticated sessions, redirect
/// everyone else to the login page with a `302 Found`.
pub async fn require_auth(
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    match AuthStatus::of(&session) {
        AuthStatus::Authenticated(uid) => {
            debug!(uid = %uid, path = %request.uri().path(), "Session authenticated");
            next.run(request).await
        }
        AuthStatus::Anonymous => {
            debug!(path = %request.uri().path(), "Anonymous session, redirecting to login");
            found(RouteName::CpLogin.path())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        MemorySessionStore, SESSION_COOKIE_NAME, SESSION_UID, SessionConfig, Sessions,
        session_layer,
    };
    use anyhow::Result;
    use axum::{
        Router,
        body::Body,
        http::{
            HeaderMap, Request, StatusCode,
            header::{COOKIE, LOCATION},
        },
        middleware,
        routing::get,
    };
    use serde_json::json;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tower::ServiceExt;

    fn sessions() -> Arc<Sessions> {
        Arc::new(Sessions::new(
            Arc::new(MemorySessionStore::new(Duration::from_secs(60))),
            SessionConfig::new(),
        ))
    }

    fn app(sessions: &Arc<Sessions>, calls: &Arc<AtomicUsize>) -> Router {
        let calls = Arc::clone(calls);
        Router::new()
            .route(
                "/cp",
                get(move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "dashboard"
                }),
            )
            .route_layer(middleware::from_fn(require_auth))
            .layer(middleware::from_fn_with_state(
                Arc::clone(sessions),
                session_layer,
            ))
    }

    fn session_with_uid(sessions: &Sessions, uid: serde_json::Value) -> Result<String> {
        let session = sessions.get(&HeaderMap::new())?;
        session.set(SESSION_UID, uid);
        sessions.save(&session)?;
        Ok(session.id())
    }

    async fn get_cp(app: Router, session_id: Option<&str>) -> Result<axum::response::Response> {
        let mut request = Request::builder().uri("/cp");
        if let Some(id) = session_id {
            request = request.header(COOKIE, format!("{SESSION_COOKIE_NAME}={id}"));
        }
        Ok(app.oneshot(request.body(Body::empty())?).await?)
    }

    #[test]
    fn auth_status_follows_identity() -> Result<()> {
        let sessions = sessions();
        let session = sessions.get(&HeaderMap::new())?;
        assert_eq!(AuthStatus::of(&session), AuthStatus::Anonymous);

        session.set(SESSION_UID, "admin");
        assert_eq!(
            AuthStatus::of(&session),
            AuthStatus::Authenticated("admin".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn anonymous_request_is_redirected() -> Result<()> {
        let sessions = sessions();
        let calls = Arc::new(AtomicUsize::new(0));

        let response = get_cp(app(&sessions, &calls), None).await?;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok()),
            Some("/cp/login")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn empty_or_non_string_identity_is_redirected() -> Result<()> {
        let sessions = sessions();
        let calls = Arc::new(AtomicUsize::new(0));

        for uid in [json!(""), json!(null), json!(["admin"])] {
            let id = session_with_uid(&sessions, uid)?;
            let response = get_cp(app(&sessions, &calls), Some(&id)).await?;
            assert_eq!(response.status(), StatusCode::FOUND);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn authenticated_request_reaches_handler() -> Result<()> {
        let sessions = sessions();
        let calls = Arc::new(AtomicUsize::new(0));
        let id = session_with_uid(&sessions, json!("admin"))?;

        let response = get_cp(app(&sessions, &calls), Some(&id)).await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
