//! Axum route handlers for the activation server.
//!
//! # Routes
//!
//! - `GET  /health`     - Returns `{"status": "ok", "version": ...}`
//! - `POST /signals`    - Accepts a `Signal`, returns the dispatch outcome
//! - `GET  /behaviours` - Bound behaviour IDs with their signatures

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::dispatch::{Dispatch, DispatchError, Dispatcher};
use crate::payload::Signal;
use crate::registry::RegistryError;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/signals", post(signal_handler))
        .route("/behaviours", get(behaviours_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health - liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "activation-engine",
    }))
}

/// POST /signals - queue a signal and run its destination if complete.
///
/// Activation touches the persistence backend synchronously, so it runs on
/// the blocking pool.
async fn signal_handler(
    State(state): State<AppState>,
    Json(signal): Json<Signal>,
) -> Result<Json<Dispatch>, (StatusCode, Json<Value>)> {
    let dispatcher = Arc::clone(&state.dispatcher);
    let outcome = tokio::task::spawn_blocking(move || dispatcher.handle(signal))
        .await
        .map_err(|e| {
            tracing::error!("Dispatch task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        })?;

    match outcome {
        Ok(dispatch) => Ok(Json(dispatch)),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!("Signal dispatch failed: {}", e);
            }
            Err(error_response(status, &e.to_string()))
        }
    }
}

/// GET /behaviours - list bound behaviours.
async fn behaviours_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.dispatcher.registry();
    let behaviours: Vec<Value> = registry
        .behaviours()
        .into_iter()
        .map(|(id, unit)| {
            let signature = registry
                .unit(unit)
                .map(|u| u.signature.clone())
                .unwrap_or_default();
            json!({ "id": id, "unit": unit, "signature": signature })
        })
        .collect();
    Json(json!({ "behaviours": behaviours }))
}

fn status_for(error: &DispatchError) -> StatusCode {
    match error {
        DispatchError::Activation(e) if e.is_integrity() => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchError::Registry(RegistryError::ArgumentMismatch { .. })
        | DispatchError::Registry(RegistryError::Execution { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}
