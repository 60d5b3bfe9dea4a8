use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Area, Event, EventType, Query, Vehicle, VehicleStatus};

// Query string de búsqueda por área
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindVehiclesParams {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub status: VehicleStatus,
}

impl From<FindVehiclesParams> for Query {
    fn from(params: FindVehiclesParams) -> Self {
        Query::new(
            Area::new(params.min_lat, params.max_lat, params.min_lng, params.max_lng),
            params.status,
        )
    }
}

// Request para reemplazar un vehículo; el id viene del path
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub status: VehicleStatus,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,

    pub updated_at: Option<DateTime<Utc>>,
}

impl UpdateVehicleRequest {
    /// El `updatedAt` resultante nunca queda por detrás del de `previous`.
    pub fn into_vehicle(self, id: Uuid, previous: Option<&Vehicle>) -> Vehicle {
        let requested = self.updated_at.unwrap_or_else(Utc::now);
        let updated_at = match previous {
            Some(previous) => requested.max(previous.updated_at),
            None => requested,
        };

        Vehicle {
            id,
            status: self.status,
            lat: self.lat,
            lng: self.lng,
            updated_at,
        }
    }
}

// Request para reportar un evento
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportEventRequest {
    pub id: Option<Uuid>,

    pub vehicle_id: Option<Uuid>,

    #[serde(rename = "type")]
    pub event_type: EventType,

    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

impl From<ReportEventRequest> for Event {
    fn from(request: ReportEventRequest) -> Self {
        Event {
            id: request.id.unwrap_or_else(Uuid::nil),
            vehicle_id: request.vehicle_id.unwrap_or_else(Uuid::nil),
            event_type: request.event_type,
            timestamp: request.timestamp,
            lat: request.lat,
            lng: request.lng,
        }
    }
}
