//! Validación de entrada por operación
//!
//! Funciones puras: sin I/O y sin estado compartido. El servicio recibe un
//! `Validator` en su construcción para poder sustituirlo en tests.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, Query, Vehicle};

/// Fallos de validación. Se detectan antes de tocar el almacenamiento.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid vehicle id")]
    InvalidId,

    #[error("invalid query params")]
    InvalidQuery,

    #[error("invalid area bounds")]
    InvalidAreaBounds,

    #[error("invalid event vehicle id")]
    InvalidVehicleId,

    #[error("invalid event type")]
    InvalidEventType,
}

/// Operación a validar junto con su payload tipado
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    GetVehicle(Uuid),
    UpdateVehicle(&'a Vehicle),
    FindVehicles(&'a Query),
    ReportEvent(&'a Event),
}

pub trait Validator: Send + Sync {
    fn validate(&self, op: Operation<'_>) -> Result<(), ValidationError>;
}

/// Cualquier closure con la firma correcta sirve como validador.
impl<F> Validator for F
where
    F: Fn(Operation<'_>) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, op: Operation<'_>) -> Result<(), ValidationError> {
        self(op)
    }
}

/// Reglas por defecto
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl Validator for DefaultValidator {
    fn validate(&self, op: Operation<'_>) -> Result<(), ValidationError> {
        match op {
            Operation::GetVehicle(id) => validate_vehicle_id(id),
            Operation::UpdateVehicle(vehicle) => validate_vehicle_id(vehicle.id),
            Operation::FindVehicles(query) => validate_query(query),
            Operation::ReportEvent(event) => validate_event(event),
        }
    }
}

pub fn validate_vehicle_id(id: Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::InvalidId);
    }
    Ok(())
}

/// NaN en cualquier borde hace la query inservible; bordes invertidos son un
/// área inválida.
pub fn validate_query(query: &Query) -> Result<(), ValidationError> {
    if !query.area.is_finite() {
        return Err(ValidationError::InvalidQuery);
    }
    if !query.area.has_ordered_bounds() {
        return Err(ValidationError::InvalidAreaBounds);
    }
    Ok(())
}

pub fn validate_event(event: &Event) -> Result<(), ValidationError> {
    if event.vehicle_id.is_nil() {
        return Err(ValidationError::InvalidVehicleId);
    }
    if !event.event_type.is_recognized() {
        return Err(ValidationError::InvalidEventType);
    }
    Ok(())
}
