//! Middleware de CORS
//!
//! El mapa de riders se sirve desde otros orígenes; sólo se exponen los
//! métodos y cabeceras que usa la API de telemetría.

use axum::http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

use super::auth::{API_KEY_HEADER, CLIENT_ID_HEADER};

pub fn cors_middleware() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static(API_KEY_HEADER),
            HeaderName::from_static(CLIENT_ID_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}
