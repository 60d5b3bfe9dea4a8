//! Modelo de Event
//!
//! Registro inmutable de algo que le ocurrió a un vehículo. Una vez guardado
//! nunca se modifica ni se borra.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tipo de evento reportado por un vehículo o un rider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TripStart,
    TripEnd,
    Location,
    /// Cualquier tipo que no reconocemos; lo rechaza el validador.
    #[serde(other)]
    Unrecognized,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TripStart => "trip_start",
            EventType::TripEnd => "trip_end",
            EventType::Location => "location",
            EventType::Unrecognized => "unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, EventType::Unrecognized)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event principal - mapea a la tabla events
///
/// `id` nulo y `timestamp` ausente significan "asígnalos tú"; el servicio los
/// completa antes de persistir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub vehicle_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

impl Event {
    pub fn new(vehicle_id: Uuid, event_type: EventType) -> Self {
        Self {
            id: Uuid::nil(),
            vehicle_id,
            event_type,
            timestamp: None,
            lat: 0.0,
            lng: 0.0,
        }
    }

    pub fn location(vehicle_id: Uuid, lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            ..Self::new(vehicle_id, EventType::Location)
        }
    }

    /// Completa identidad y timestamp si el llamador no los envió.
    pub fn gen_create_vals(&mut self) {
        if self.id.is_nil() {
            self.id = Uuid::new_v4();
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now());
        }
    }
}
