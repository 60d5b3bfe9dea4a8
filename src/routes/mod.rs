//! Router HTTP de la API de telemetría

pub mod telemetry_routes;

use axum::{error_handling::HandleErrorLayer, middleware::from_fn_with_state, routing::get, BoxError, Router};
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{api_key_middleware, cors_middleware};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Construye el router completo. `/healthz` queda fuera de la autenticación.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let api = telemetry_routes::create_telemetry_router()
        .route_layer(from_fn_with_state(state.clone(), api_key_middleware));

    Router::new()
        .route("/healthz", get(telemetry_routes::healthz))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_middleware())
                .layer(CompressionLayer::new())
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

async fn handle_timeout_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(err.to_string())
    }
}
