//! Middleware de autenticación por API key
//!
//! Toda ruta bajo `/api/v1` exige una `X-API-Key` válida. El `X-Client-ID`
//! opcional se adjunta al request como `ClientId` para prefijar los logs.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::utils::errors::AppError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Identificador del llamador tal y como lo envió
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn log_prefix(&self) -> String {
        if self.0.is_empty() {
            String::new()
        } else {
            format!("[{}] ", self.0)
        }
    }
}

/// Claves aceptadas, construidas una vez desde la configuración
#[derive(Debug, Clone)]
pub struct ApiKeys(Arc<Vec<String>>);

impl ApiKeys {
    pub fn new(keys: Vec<String>) -> Self {
        Self(Arc::new(keys))
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        self.0.iter().any(|k| k == candidate)
    }
}

pub async fn api_key_middleware(
    State(keys): State<ApiKeys>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = header_str(&headers, API_KEY_HEADER);
    let client_id = header_str(&headers, CLIENT_ID_HEADER);

    if !keys.accepts(api_key) {
        tracing::warn!(
            "🔒 API key inválida: {:?}, cliente: {:?}, ruta: {}",
            mask(api_key),
            client_id,
            request.uri().path()
        );
        return Err(AppError::Unauthorized("invalid API key".to_string()));
    }

    request
        .extensions_mut()
        .insert(ClientId(client_id.to_string()));
    Ok(next.run(request).await)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
}

/// Enmascara una API key para los logs
pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 4 {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "[redacted]".to_string()
    }
}
