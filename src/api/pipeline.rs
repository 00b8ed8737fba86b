//! Per-request pipeline run in front of every route:
//! rate limit → CORS preflight → auth gate (`/api/*` only) → handler,
//! with CORS headers attached to every API and health response.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::error::ApiError;
use super::rest::{AppState, API_PREFIX, HEALTH_PATH};

const UNKNOWN_CLIENT: &str = "unknown";

pub async fn request_pipeline(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client = client_key(&req);
    let cors = state.cors.headers(req.headers());

    if state.limiter.is_limited(&client) {
        warn!(client = %client, path = %req.uri().path(), "rate limit exceeded");
        let retry_after_secs = state.limiter.window().as_secs();
        return with_headers(ApiError::RateLimited { retry_after_secs }.into_response(), cors);
    }

    if req.method() == Method::OPTIONS {
        return with_headers(StatusCode::NO_CONTENT.into_response(), cors);
    }

    let path = req.uri().path();
    let decorate = path == HEALTH_PATH || path.starts_with(API_PREFIX);

    // `/health` stays credential-free for external uptime monitors.
    if path.starts_with(API_PREFIX) && !state.auth.check(req.headers()) {
        warn!(client = %client, path = %path, "rejected request: missing or invalid token");
        return with_headers(ApiError::Unauthorized.into_response(), cors);
    }

    let response = next.run(req).await;
    if decorate {
        with_headers(response, cors)
    } else {
        response
    }
}

/// Peer IP of the connection; in-process callers without one share a bucket.
fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn with_headers(mut response: Response, headers: HeaderMap) -> Response {
    response.headers_mut().extend(headers);
    response
}
