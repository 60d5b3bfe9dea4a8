//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle (scooter compartido) y su estado de
//! ocupación. Mapea exactamente a la tabla `vehicles` y al JSON de la API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Estado de ocupación del vehículo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Free,
    Occupied,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Free => "free",
            VehicleStatus::Occupied => "occupied",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(VehicleStatus::Free),
            "occupied" => Ok(VehicleStatus::Occupied),
            other => Err(format!("unknown vehicle status '{}'", other)),
        }
    }
}

/// Vehicle principal - posición, estado y marca de tiempo de la última mutación
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default)]
    pub id: Uuid,
    pub status: VehicleStatus,
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(status: VehicleStatus, lat: f64, lng: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            status,
            lat,
            lng,
            updated_at: Utc::now(),
        }
    }

    /// Marca el inicio de un viaje. La posición no cambia.
    pub fn start_ride(&mut self) {
        self.status = VehicleStatus::Occupied;
        self.touch();
    }

    /// Marca el final de un viaje. La posición no cambia.
    pub fn stop_ride(&mut self) {
        self.status = VehicleStatus::Free;
        self.touch();
    }

    pub fn update_location(&mut self, lat: f64, lng: f64) {
        self.lat = lat;
        self.lng = lng;
        self.touch();
    }

    /// Sella una nueva `updated_at` estrictamente posterior a la anterior.
    ///
    /// El reloj de pared puede repetirse o retroceder; en ese caso se avanza
    /// un microsegundo (la precisión de `TIMESTAMPTZ`) sobre el valor previo.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}
