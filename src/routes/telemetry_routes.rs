use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{FindVehiclesParams, ReportEventRequest, UpdateVehicleRequest};
use crate::middleware::auth::ClientId;
use crate::models::{Event, Vehicle};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

pub fn create_telemetry_router() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(find_vehicles))
        .route("/vehicles/:id", get(get_vehicle).put(update_vehicle))
        .route("/events", post(report_event))
}

pub async fn healthz() -> &'static str {
    "ok"
}

async fn find_vehicles(
    State(state): State<AppState>,
    client: Option<Extension<ClientId>>,
    params: Result<Query<FindVehiclesParams>, QueryRejection>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let Query(params) = params.map_err(|e| bad_request_error(&e.body_text()))?;

    let vehicles = state
        .service
        .find_vehicles(params.into())
        .await
        .map_err(|e| log_error(&client, "buscar vehículos", e))?;
    Ok(Json(vehicles))
}

async fn get_vehicle(
    State(state): State<AppState>,
    client: Option<Extension<ClientId>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vehicle>, AppError> {
    let Path(id) = id.map_err(|e| bad_request_error(&e.body_text()))?;

    let vehicle = state
        .service
        .get_vehicle(id)
        .await
        .map_err(|e| log_error(&client, "obtener vehículo", e))?;
    Ok(Json(vehicle))
}

async fn update_vehicle(
    State(state): State<AppState>,
    client: Option<Extension<ClientId>>,
    id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<UpdateVehicleRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(|e| bad_request_error(&e.body_text()))?;
    let Json(request) = request.map_err(|e| bad_request_error(&e.body_text()))?;
    request.validate()?;

    let previous = match state.service.get_vehicle(id).await {
        Ok(vehicle) => Some(vehicle),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(log_error(&client, "actualizar vehículo", e)),
    };

    state
        .service
        .update_vehicle(request.into_vehicle(id, previous.as_ref()))
        .await
        .map_err(|e| log_error(&client, "actualizar vehículo", e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_event(
    State(state): State<AppState>,
    client: Option<Extension<ClientId>>,
    request: Result<Json<ReportEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let Json(request) = request.map_err(|e| bad_request_error(&e.body_text()))?;
    request.validate()?;

    let event = state
        .service
        .report_event(request.into())
        .await
        .map_err(|e| log_error(&client, "reportar evento", e))?;
    Ok((StatusCode::CREATED, Json(event)))
}

fn log_error(client: &Option<Extension<ClientId>>, operation: &str, error: AppError) -> AppError {
    let prefix = client
        .as_ref()
        .map(|Extension(id)| id.log_prefix())
        .unwrap_or_default();

    if error.status_code().is_server_error() {
        tracing::error!("{}❌ Error en {}: {}", prefix, operation, error);
    } else {
        tracing::debug!("{}⚠️ {} rechazado: {}", prefix, operation, error);
    }
    error
}
