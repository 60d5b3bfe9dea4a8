//! Servicio de telemetría
//!
//! Orquesta validar → leer → transicionar → persistir para cada operación.
//! No guarda estado mutable propio: todo vive detrás del repositorio, y cada
//! llamada relee el estado actual.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Event, EventType, Query, Vehicle};
use crate::repositories::TelemetryRepository;
use crate::utils::errors::AppResult;
use crate::utils::validation::{DefaultValidator, Operation, Validator};

#[derive(Clone)]
pub struct TelemetryService {
    repository: Arc<dyn TelemetryRepository>,
    validator: Arc<dyn Validator>,
}

impl TelemetryService {
    pub fn new(repository: Arc<dyn TelemetryRepository>) -> Self {
        Self::with_validator(repository, Arc::new(DefaultValidator))
    }

    /// Permite inyectar un validador distinto, útil en tests.
    pub fn with_validator(
        repository: Arc<dyn TelemetryRepository>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self {
            repository,
            validator,
        }
    }

    pub async fn get_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.validator.validate(Operation::GetVehicle(id))?;
        self.repository.get_vehicle(id).await
    }

    /// Reemplazo completo del registro. Dos updates concurrentes al mismo id
    /// se serializan en el backend y gana el último en terminar.
    pub async fn update_vehicle(&self, vehicle: Vehicle) -> AppResult<()> {
        self.validator.validate(Operation::UpdateVehicle(&vehicle))?;
        self.repository.update_vehicle(&vehicle).await
    }

    /// Sin paginación ni orden: devuelve todas las coincidencias.
    pub async fn find_vehicles(&self, query: Query) -> AppResult<Vec<Vehicle>> {
        self.validator.validate(Operation::FindVehicles(&query))?;
        self.repository
            .find_vehicles_in_area(&query.area, query.status)
            .await
    }

    /// Procesa un evento y proyecta su efecto sobre el vehículo.
    ///
    /// Los pasos no son atómicos entre sí. El log de eventos es la fuente de
    /// verdad: si el evento se guarda y luego falla la lectura o el update del
    /// vehículo, el evento queda registrado y la proyección queda atrasada.
    /// Devuelve el evento tal y como se guardó.
    pub async fn report_event(&self, mut event: Event) -> AppResult<Event> {
        self.validator.validate(Operation::ReportEvent(&event))?;

        event.gen_create_vals();

        self.repository.store_event(&event).await?;

        let mut vehicle = match self.repository.get_vehicle(event.vehicle_id).await {
            Ok(vehicle) => vehicle,
            Err(e) => {
                tracing::warn!(
                    "⚠️ Evento {} guardado pero no se pudo leer el vehículo {}: {}",
                    event.id,
                    event.vehicle_id,
                    e
                );
                return Err(e);
            }
        };

        apply_event(&mut vehicle, &event);

        if let Err(e) = self.repository.update_vehicle(&vehicle).await {
            tracing::warn!(
                "⚠️ Evento {} guardado pero falló la proyección del vehículo {}: {}",
                event.id,
                vehicle.id,
                e
            );
            return Err(e);
        }

        tracing::debug!(
            "🛴 {} aplicado al vehículo {} -> {} ({:.5}, {:.5})",
            event.event_type,
            vehicle.id,
            vehicle.status,
            vehicle.lat,
            vehicle.lng
        );

        Ok(event)
    }
}

/// Transición de estado por tipo de evento. Cada rama sella una nueva
/// `updated_at` estrictamente posterior a la anterior.
pub fn apply_event(vehicle: &mut Vehicle, event: &Event) {
    match event.event_type {
        EventType::TripStart => vehicle.start_ride(),
        EventType::TripEnd => vehicle.stop_ride(),
        EventType::Location => vehicle.update_location(event.lat, event.lng),
        // el validador ya lo rechazó
        EventType::Unrecognized => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Area, VehicleStatus};
    use crate::repositories::MemoryTelemetryRepository;
    use crate::utils::errors::AppError;
    use crate::utils::validation::ValidationError;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service_with(vehicles: Vec<Vehicle>) -> (TelemetryService, Arc<MemoryTelemetryRepository>) {
        let repo = Arc::new(MemoryTelemetryRepository::with_vehicles(vehicles));
        (TelemetryService::new(repo.clone()), repo)
    }

    /// Repositorio que cuenta llamadas y puede fallar en `update_vehicle`.
    #[derive(Default)]
    struct CountingRepository {
        inner: MemoryTelemetryRepository,
        calls: AtomicUsize,
        fail_updates: bool,
    }

    #[async_trait]
    impl TelemetryRepository for CountingRepository {
        async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_vehicle(id).await
        }

        async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_updates {
                return Err(AppError::Internal("disk on fire".to_string()));
            }
            self.inner.update_vehicle(vehicle).await
        }

        async fn find_vehicles_in_area(
            &self,
            area: &Area,
            status: VehicleStatus,
        ) -> Result<Vec<Vehicle>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_vehicles_in_area(area, status).await
        }

        async fn store_event(&self, event: &Event) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.store_event(event).await
        }
    }

    #[tokio::test]
    async fn test_trip_start_occupies_vehicle() {
        let vehicle = Vehicle::new(VehicleStatus::Free, 45.0, -75.0);
        let (service, repo) = service_with(vec![vehicle.clone()]);

        service
            .report_event(Event::new(vehicle.id, EventType::TripStart))
            .await
            .unwrap();

        let stored = repo.get_vehicle(vehicle.id).await.unwrap();
        assert_eq!(stored.status, VehicleStatus::Occupied);
        assert_eq!((stored.lat, stored.lng), (vehicle.lat, vehicle.lng));
        assert!(stored.updated_at > vehicle.updated_at);
    }

    #[tokio::test]
    async fn test_trip_end_frees_vehicle() {
        let vehicle = Vehicle::new(VehicleStatus::Occupied, 45.0, -75.0);
        let (service, repo) = service_with(vec![vehicle.clone()]);

        service
            .report_event(Event::new(vehicle.id, EventType::TripEnd))
            .await
            .unwrap();

        let stored = repo.get_vehicle(vehicle.id).await.unwrap();
        assert_eq!(stored.status, VehicleStatus::Free);
        assert_eq!((stored.lat, stored.lng), (45.0, -75.0));
    }

    #[tokio::test]
    async fn test_location_moves_vehicle_keeps_status() {
        let vehicle = Vehicle::new(VehicleStatus::Occupied, 45.0, -75.0);
        let (service, repo) = service_with(vec![vehicle.clone()]);

        service
            .report_event(Event::location(vehicle.id, 45.01, -75.01))
            .await
            .unwrap();

        let stored = repo.get_vehicle(vehicle.id).await.unwrap();
        assert_eq!(stored.status, VehicleStatus::Occupied);
        assert_eq!((stored.lat, stored.lng), (45.01, -75.01));
    }

    #[tokio::test]
    async fn test_updated_at_advances_even_from_the_future() {
        let mut vehicle = Vehicle::new(VehicleStatus::Free, 45.0, -75.0);
        vehicle.updated_at = Utc::now() + Duration::days(1);
        let (service, repo) = service_with(vec![vehicle.clone()]);

        service
            .report_event(Event::new(vehicle.id, EventType::TripStart))
            .await
            .unwrap();

        let stored = repo.get_vehicle(vehicle.id).await.unwrap();
        assert!(stored.updated_at > vehicle.updated_at);
    }

    #[tokio::test]
    async fn test_unknown_vehicle_stores_event_then_not_found() {
        let existing = Vehicle::new(VehicleStatus::Free, 1.0, 1.0);
        let (service, repo) = service_with(vec![existing.clone()]);
        let before = repo.vehicles().await;

        let missing = Uuid::new_v4();
        let err = service
            .report_event(Event::new(missing, EventType::TripStart))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(repo.vehicles().await, before);

        let events = repo.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].vehicle_id, missing);
    }

    #[tokio::test]
    async fn test_unrecognized_type_touches_no_storage() {
        let repo = Arc::new(CountingRepository::default());
        let service = TelemetryService::new(repo.clone());

        let err = service
            .report_event(Event::new(Uuid::new_v4(), EventType::Unrecognized))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ValidationError::InvalidEventType)));
        assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validation_failures_touch_no_storage() {
        let repo = Arc::new(CountingRepository::default());
        let service = TelemetryService::new(repo.clone());

        assert!(service.get_vehicle(Uuid::nil()).await.is_err());

        let mut nil_vehicle = Vehicle::new(VehicleStatus::Free, 0.0, 0.0);
        nil_vehicle.id = Uuid::nil();
        assert!(service.update_vehicle(nil_vehicle).await.is_err());

        let inverted = Query::new(Area::new(2.0, 1.0, 0.0, 1.0), VehicleStatus::Free);
        let err = service.find_vehicles(inverted).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::InvalidAreaBounds)));

        let err = service
            .report_event(Event::new(Uuid::nil(), EventType::TripEnd))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::InvalidVehicleId)));

        assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_projection_failure_keeps_event() {
        let vehicle = Vehicle::new(VehicleStatus::Free, 45.0, -75.0);
        let repo = Arc::new(CountingRepository {
            inner: MemoryTelemetryRepository::with_vehicles([vehicle.clone()]),
            calls: AtomicUsize::new(0),
            fail_updates: true,
        });
        let service = TelemetryService::new(repo.clone());

        let result = service
            .report_event(Event::new(vehicle.id, EventType::TripStart))
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(repo.inner.events().await.len(), 1);
        assert_eq!(
            repo.inner.get_vehicle(vehicle.id).await.unwrap().status,
            VehicleStatus::Free
        );
    }

    #[tokio::test]
    async fn test_report_event_assigns_missing_identity() {
        let vehicle = Vehicle::new(VehicleStatus::Free, 45.0, -75.0);
        let (service, repo) = service_with(vec![vehicle.clone()]);

        let stored = service
            .report_event(Event::new(vehicle.id, EventType::TripStart))
            .await
            .unwrap();

        assert!(!stored.id.is_nil());
        assert!(stored.timestamp.is_some());
        assert_eq!(repo.events().await, vec![stored]);
    }

    #[tokio::test]
    async fn test_injected_validator_is_used() {
        let vehicle = Vehicle::new(VehicleStatus::Free, 45.0, -75.0);
        let repo = Arc::new(MemoryTelemetryRepository::with_vehicles([vehicle.clone()]));
        let reject_reads = |op: Operation<'_>| -> Result<(), ValidationError> {
            match op {
                Operation::GetVehicle(_) => Err(ValidationError::InvalidId),
                _ => Ok(()),
            }
        };
        let service = TelemetryService::with_validator(repo, Arc::new(reject_reads));

        assert!(matches!(
            service.get_vehicle(vehicle.id).await,
            Err(AppError::Validation(ValidationError::InvalidId))
        ));
    }

    #[tokio::test]
    async fn test_find_vehicles_returns_exact_matches() {
        let area = Area::new(51.0, 52.0, 17.0, 18.0);
        let fleet = vec![
            Vehicle::new(VehicleStatus::Free, 51.0, 17.0),
            Vehicle::new(VehicleStatus::Free, 51.5, 17.5),
            Vehicle::new(VehicleStatus::Free, 52.0, 18.0),
            Vehicle::new(VehicleStatus::Free, 52.0001, 17.5),
            Vehicle::new(VehicleStatus::Occupied, 51.5, 17.5),
            Vehicle::new(VehicleStatus::Free, -51.5, 17.5),
        ];
        let (service, _) = service_with(fleet.clone());

        for status in [VehicleStatus::Free, VehicleStatus::Occupied] {
            let expected: HashSet<Uuid> = fleet
                .iter()
                .filter(|v| v.status == status && area.contains(v.lat, v.lng))
                .map(|v| v.id)
                .collect();

            let found: HashSet<Uuid> = service
                .find_vehicles(Query::new(area, status))
                .await
                .unwrap()
                .into_iter()
                .map(|v| v.id)
                .collect();

            assert_eq!(found, expected);
        }
    }

    #[tokio::test]
    async fn test_update_vehicle_is_full_replace() {
        let vehicle = Vehicle::new(VehicleStatus::Free, 45.0, -75.0);
        let (service, _) = service_with(vec![vehicle.clone()]);

        let replacement = Vehicle {
            status: VehicleStatus::Occupied,
            lat: 10.0,
            lng: 20.0,
            ..vehicle.clone()
        };
        service.update_vehicle(replacement.clone()).await.unwrap();

        assert_eq!(service.get_vehicle(vehicle.id).await.unwrap(), replacement);
    }

    #[tokio::test]
    async fn test_ride_scenario_end_to_end() {
        let vehicle = Vehicle::new(VehicleStatus::Free, 45.0, -75.0);
        let id = vehicle.id;
        let (service, _) = service_with(vec![vehicle]);
        let around_destination = Query::new(Area::new(45.005, 45.015, -75.015, -75.005), VehicleStatus::Free);
        let contains_v = |vs: &[Vehicle]| vs.iter().any(|v| v.id == id);

        service.report_event(Event::new(id, EventType::TripStart)).await.unwrap();
        let v = service.get_vehicle(id).await.unwrap();
        assert_eq!(v.status, VehicleStatus::Occupied);
        assert_eq!((v.lat, v.lng), (45.0, -75.0));

        service.report_event(Event::location(id, 45.01, -75.01)).await.unwrap();
        let v = service.get_vehicle(id).await.unwrap();
        assert_eq!(v.status, VehicleStatus::Occupied);
        assert_eq!((v.lat, v.lng), (45.01, -75.01));

        let before_end = service.find_vehicles(around_destination).await.unwrap();
        assert!(!contains_v(&before_end));

        service.report_event(Event::new(id, EventType::TripEnd)).await.unwrap();
        assert_eq!(service.get_vehicle(id).await.unwrap().status, VehicleStatus::Free);

        let after_end = service.find_vehicles(around_destination).await.unwrap();
        assert!(contains_v(&after_end));
    }
}
