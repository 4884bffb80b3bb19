//! HTTP surface: page routes, the protected control panel, health and static
//! assets.
//!
//! Layers, outermost first: request id, trace span, session loader, and on
//! `/cp` the auth gate.

pub mod handlers;
pub mod routes;
mod state;

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, services::ServeDir, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;

use crate::{auth::require_auth, session::session_layer};
use handlers::{dashboard, health, home, login};
use routes::RouteName;

pub use state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(RouteName::CpDashboard.path(), get(dashboard::dashboard))
        .route_layer(middleware::from_fn(require_auth));

    let pages = Router::new()
        .route(RouteName::Home.path(), get(home::home))
        .route(RouteName::CpLogin.path(), get(login::login))
        .route(RouteName::CpLoginSubmit.path(), post(login::submit))
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.sessions),
            session_layer,
        ))
        .with_state(state.clone());

    Router::new()
        .merge(pages)
        .route("/health", get(health::health))
        .nest_service(&state.static_path, ServeDir::new(&state.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            if let Err(err) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
