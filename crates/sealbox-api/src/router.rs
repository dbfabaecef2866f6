use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use sealbox_auth::AuthGate;
use sealbox_cache::Cache;
use sealbox_core::constants::MAX_BODY_BYTES;
use sealbox_keys::KeyService;
use sealbox_relay::Relay;

use crate::{handlers, ratelimit, ws};

/// Boundary-level knobs. `allowed_origin` is the production CORS origin;
/// absent means a permissive development policy.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub max_requests_per_minute: u32,
    pub allowed_origin: Option<HeaderValue>,
}

/// Shared handles injected into every handler. Built once at startup;
/// cloning is cheap (everything inside is an `Arc` or pool handle).
#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthGate>,
    pub keys: Arc<KeyService>,
    pub relay: Arc<Relay>,
    pub cache: Cache,
    pub config: ApiConfig,
}

/// Assemble the full HTTP surface: health probe, versioned API, socket
/// endpoint, rate limiter, body cap, CORS.
pub fn build_router(state: ApiState) -> Router {
    let cors = cors_layer(state.config.allowed_origin.clone());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/accounts/register", post(handlers::register))
        .route("/api/v1/accounts/challenge", post(handlers::challenge))
        .route("/api/v1/accounts/verify", post(handlers::verify))
        .route("/api/v1/keys/{account_id}", get(handlers::fetch_bundle))
        .route("/api/v1/keys/prekeys", put(handlers::upload_prekeys))
        .route("/api/v1/keys/signed", put(handlers::rotate_signed_prekey))
        .route("/api/v1/messages/send", post(handlers::send_message))
        .route("/api/v1/messages/receive", get(handlers::receive_messages))
        .route("/api/v1/messages/{id}", delete(handlers::delete_message))
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ratelimit::rate_limit,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Production: exactly one origin, no wildcard credentials. Development
/// (no domain configured): permissive.
fn cors_layer(allowed_origin: Option<HeaderValue>) -> CorsLayer {
    match allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}
