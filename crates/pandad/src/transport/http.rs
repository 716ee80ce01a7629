//! HTTP adapter: `POST /v1` for JSON-RPC, `GET /health`, and CORS.
//!
//! The adapter reads the body and hands the bytes to the dispatcher. JSON-RPC
//! errors travel in the body with HTTP status 200; only a failure to encode
//! the response surfaces as an HTTP error, which axum's `Json` handles.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

use panda_config::Config;

use crate::dispatch::{DispatchError, Dispatcher, RequestId, RpcResponse};

use super::TRANSPORT_TARGET;

/// Path of the JSON-RPC endpoint.
pub const RPC_PATH: &str = "/v1";
/// Path of the liveness probe.
pub const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
    max_request_bytes: usize,
}

/// Builds the HTTP router for `dispatcher` using the transport settings in
/// `config`.
pub fn router(dispatcher: Arc<Dispatcher>, config: &Config) -> Router {
    let state = AppState {
        dispatcher,
        max_request_bytes: config.max_request_bytes(),
    };
    Router::new()
        .route(RPC_PATH, post(handle_rpc))
        .route(HEALTH_PATH, get(handle_health))
        .layer(DefaultBodyLimit::max(config.max_request_bytes()))
        .layer(cors_layer(config.cors_allowed_origins()))
        .with_state(state)
}

async fn handle_rpc(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<RpcResponse> {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            let error = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                DispatchError::request_too_large(state.max_request_bytes)
            } else {
                DispatchError::invalid_request(rejection.body_text())
            };
            warn!(target: TRANSPORT_TARGET, %error, "request body rejected");
            return Json(RpcResponse::failure(RequestId::null(), &error));
        }
    };

    debug!(target: TRANSPORT_TARGET, bytes = bytes.len(), "received request");
    Json(state.dispatcher.dispatch(&bytes).await)
}

async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    let backends: Vec<Value> = state
        .dispatcher
        .registry()
        .iter()
        .map(|backend| {
            json!({
                "name": backend.name(),
                "kind": backend.kind().to_string(),
                "proofs": backend.kind().supports_proofs(),
            })
        })
        .collect();
    Json(json!({
        "status": "ok",
        "failurePolicy": state.dispatcher.policy().to_string(),
        "backends": backends,
    }))
}

/// Any origin without credentials when `origins` is empty, otherwise the
/// listed origins with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request());

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(
                    target: TRANSPORT_TARGET,
                    origin = origin.as_str(),
                    %error,
                    "ignoring invalid CORS origin"
                );
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}
