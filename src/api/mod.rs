//! Demo HTTP server driving the SSO flow from a browser.
//!
//! The browser never sees the upstream cookie: `/api/captcha` stores it in the
//! [`SessionStore`] and hands out an opaque `sufe_sid` cookie instead.

use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use std::{net::Ipv6Addr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

use crate::sso::SsoClient;

pub mod handlers;
pub mod session;

pub use session::SessionStore;

/// Build the router with shared state attached.
#[must_use]
pub fn router(client: SsoClient, sessions: Arc<SessionStore>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/captcha", get(handlers::captcha))
        .route("/api/sms", post(handlers::sms))
        .route("/api/login", post(handlers::login))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(client))
                .layer(Extension(sessions)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(port: u16, client: SsoClient, sessions: Arc<SessionStore>) -> Result<()> {
    let app = router(client, sessions);

    let listener = TcpListener::bind((Ipv6Addr::UNSPECIFIED, port)).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
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
