//! Backend en memoria
//!
//! Un único `RwLock` protege el mapa de vehículos y el log de eventos a la
//! vez: una sección crítica por llamada, sin locks anidados. Las lecturas
//! (`get_vehicle`, `find_vehicles_in_area`) comparten el lock; las escrituras
//! (`update_vehicle`, `store_event`) lo toman en exclusiva. Nunca se hace I/O
//! con el lock tomado.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::seed::{generate_vehicles, CitySeed};
use super::TelemetryRepository;
use crate::models::{Area, Event, Query, Vehicle, VehicleStatus};
use crate::utils::errors::{not_found_error, AppError};

#[derive(Debug, Default)]
struct TelemetryStore {
    vehicles: HashMap<Uuid, Vehicle>,
    events: Vec<Event>,
}

#[derive(Debug, Default)]
pub struct MemoryTelemetryRepository {
    store: RwLock<TelemetryStore>,
}

impl MemoryTelemetryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let vehicles = vehicles.into_iter().map(|v| (v.id, v)).collect();
        Self {
            store: RwLock::new(TelemetryStore {
                vehicles,
                events: Vec::new(),
            }),
        }
    }

    /// Puebla la flota con vehículos aleatorios de cada ciudad.
    pub async fn seed(&self, cities: &[CitySeed]) -> usize {
        let generated: Vec<Vehicle> = {
            let mut rng = rand::thread_rng();
            cities
                .iter()
                .flat_map(|city| generate_vehicles(city, &mut rng))
                .collect()
        };
        let count = generated.len();

        let mut store = self.store.write().await;
        store.vehicles.extend(generated.into_iter().map(|v| (v.id, v)));

        tracing::info!("🛴 {} vehículos generados en memoria", count);
        count
    }

    /// Copia del mapa de vehículos para tests de caja negra.
    pub async fn vehicles(&self) -> HashMap<Uuid, Vehicle> {
        self.store.read().await.vehicles.clone()
    }

    /// Copia del log de eventos en orden de llegada.
    pub async fn events(&self) -> Vec<Event> {
        self.store.read().await.events.clone()
    }
}

#[async_trait]
impl TelemetryRepository for MemoryTelemetryRepository {
    async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, AppError> {
        let store = self.store.read().await;
        store
            .vehicles
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), AppError> {
        let mut store = self.store.write().await;
        store.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    /// Recorrido lineal de todo el mapa.
    async fn find_vehicles_in_area(
        &self,
        area: &Area,
        status: VehicleStatus,
    ) -> Result<Vec<Vehicle>, AppError> {
        let query = Query::new(*area, status);
        let store = self.store.read().await;
        let result = store
            .vehicles
            .values()
            .filter(|v| query.matches(v))
            .cloned()
            .collect();

        Ok(result)
    }

    async fn store_event(&self, event: &Event) -> Result<(), AppError> {
        let mut store = self.store.write().await;
        store.events.push(event.clone());
        Ok(())
    }
}
