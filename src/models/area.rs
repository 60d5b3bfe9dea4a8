//! Área rectangular de búsqueda y la query que la combina con un estado.

use serde::{Deserialize, Serialize};

use super::vehicle::{Vehicle, VehicleStatus};

/// Envolvente lat/lng con bordes inclusivos
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Area {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Un rectángulo degenerado (min == max) también es válido.
    pub fn has_ordered_bounds(&self) -> bool {
        self.min_lat <= self.max_lat && self.min_lng <= self.max_lng
    }

    pub fn is_finite(&self) -> bool {
        [self.min_lat, self.max_lat, self.min_lng, self.max_lng]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// Query de búsqueda: un área más el filtro de estado. Nunca se persiste.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Query {
    pub area: Area,
    pub status: VehicleStatus,
}

impl Query {
    pub fn new(area: Area, status: VehicleStatus) -> Self {
        Self { area, status }
    }

    /// Predicado de pertenencia del backend en memoria. PostGIS aplica el
    /// mismo criterio con `ST_Covers` (bordes incluidos).
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        vehicle.status == self.status && self.area.contains(vehicle.lat, vehicle.lng)
    }
}
