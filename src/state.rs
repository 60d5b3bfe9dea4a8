//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use axum::extract::FromRef;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::middleware::auth::ApiKeys;
use crate::repositories::TelemetryRepository;
use crate::services::TelemetryService;

#[derive(Clone)]
pub struct AppState {
    pub service: TelemetryService,
    pub api_keys: ApiKeys,
}

impl AppState {
    pub fn new(repository: Arc<dyn TelemetryRepository>, config: &EnvironmentConfig) -> Self {
        Self::with_service(TelemetryService::new(repository), config.api_keys.clone())
    }

    pub fn with_service(service: TelemetryService, api_keys: Vec<String>) -> Self {
        Self {
            service,
            api_keys: ApiKeys::new(api_keys),
        }
    }
}

impl FromRef<AppState> for ApiKeys {
    fn from_ref(state: &AppState) -> Self {
        state.api_keys.clone()
    }
}
