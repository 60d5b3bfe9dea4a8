//! Repositorios de telemetría
//!
//! El contrato de almacenamiento que consume el servicio, con dos backends
//! intercambiables: en memoria y PostgreSQL/PostGIS. El backend se elige una
//! vez al arrancar y el servicio lo guarda como `Arc<dyn TelemetryRepository>`.

pub mod memory_repository;
pub mod postgres_repository;
pub mod seed;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Area, Event, Vehicle, VehicleStatus};
use crate::utils::errors::AppError;

pub use memory_repository::MemoryTelemetryRepository;
pub use postgres_repository::PgTelemetryRepository;
pub use seed::CitySeed;

/// Contrato de almacenamiento que deben cumplir todos los backends.
///
/// La cancelación es la de cualquier future: si el llamador lo descarta, la
/// operación no continúa.
#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Falla con `AppError::NotFound` si el vehículo no existe.
    async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, AppError>;

    /// Upsert idempotente por id; reemplaza el registro completo.
    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), AppError>;

    /// Vehículos con `status` dentro de `area` (bordes inclusivos). El orden
    /// del resultado no está especificado.
    async fn find_vehicles_in_area(
        &self,
        area: &Area,
        status: VehicleStatus,
    ) -> Result<Vec<Vehicle>, AppError>;

    /// Añade el evento al log. Nunca falla por identidad duplicada.
    async fn store_event(&self, event: &Event) -> Result<(), AppError>;
}
