//! Rider simulado
//!
//! Un llamador HTTP más de la API: busca vehículos libres cerca, hace un
//! viaje reportando su posición y descansa antes de repetir.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use uuid::Uuid;

use crate::middleware::auth::{API_KEY_HEADER, CLIENT_ID_HEADER};
use crate::models::{EventType, Vehicle, VehicleStatus};
use crate::utils::geo::{bounding_box, distance_meters};

const SEARCH_RADIUS_METERS: f64 = 400.0;
const HTTP_TIMEOUT: Duration = Duration::from_secs(2);
const RETRY_DELAY: Duration = Duration::from_secs(1);
const NO_VEHICLES_REST: Duration = Duration::from_secs(2);
const PRE_RIDE_DELAY: Duration = Duration::from_millis(200);
const LOCATION_INTERVAL: Duration = Duration::from_secs(3);
const TRIP_SECS: std::ops::RangeInclusive<u64> = 10..=15;
const REST_SECS: std::ops::RangeInclusive<u64> = 2..=5;
const JITTER_DEG: f64 = 0.01;

pub struct SimClient {
    id: Uuid,
    tag: String,
    api_key: String,
    base_url: String,
    http: Client,
    rng: StdRng,
    lat: f64,
    lng: f64,
}

impl SimClient {
    pub fn new(tag: &str, api_key: String, base_url: String, lat: f64, lng: f64) -> Result<Self> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            id: Uuid::new_v4(),
            tag: tag.to_lowercase(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            rng: StdRng::from_entropy(),
            lat,
            lng,
        })
    }

    /// `<ciudad>-<últimos 8 caracteres del uuid>`
    pub fn tag_id(&self) -> String {
        let id = self.id.to_string();
        format!("{}-{}", self.tag, &id[id.len() - 8..])
    }

    pub fn position(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    /// Vehículos libres dentro de la caja de búsqueda alrededor del rider.
    pub async fn find_vehicles(&self) -> Result<Vec<Vehicle>> {
        let area = bounding_box(self.lat, self.lng, SEARCH_RADIUS_METERS);

        let response = self
            .http
            .get(format!("{}/api/v1/vehicles", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header(CLIENT_ID_HEADER, self.tag_id())
            .query(&[
                ("minLat", area.min_lat.to_string()),
                ("maxLat", area.max_lat.to_string()),
                ("minLng", area.min_lng.to_string()),
                ("maxLng", area.max_lng.to_string()),
                ("status", VehicleStatus::Free.as_str().to_string()),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(anyhow!("unexpected status: {}", response.status()));
        }
        Ok(response.json::<Vec<Vehicle>>().await?)
    }

    pub async fn start_ride(&self, vehicle_id: Uuid) -> Result<()> {
        self.send_event(vehicle_id, EventType::TripStart, 0.0, 0.0).await
    }

    pub async fn stop_ride(&self, vehicle_id: Uuid) -> Result<()> {
        self.send_event(vehicle_id, EventType::TripEnd, 0.0, 0.0).await
    }

    /// El rider se mueve junto con el vehículo.
    pub async fn update_location(&mut self, vehicle_id: Uuid, lat: f64, lng: f64) -> Result<()> {
        self.lat = lat;
        self.lng = lng;
        self.send_event(vehicle_id, EventType::Location, lat, lng).await
    }

    async fn send_event(&self, vehicle_id: Uuid, event_type: EventType, lat: f64, lng: f64) -> Result<()> {
        let body = json!({
            "vehicleId": vehicle_id,
            "type": event_type.as_str(),
            "lat": lat,
            "lng": lng,
        });

        let response = self
            .http
            .post(format!("{}/api/v1/events", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header(CLIENT_ID_HEADER, self.tag_id())
            .json(&body)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(anyhow!("event post failed: {}", response.status()));
        }
        Ok(())
    }

    /// Bucle principal; termina cuando `shutdown` pasa a `true` o el emisor
    /// desaparece.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("[{}] 🛴 Posición inicial: ({:.5}, {:.5})", self.tag_id(), self.lat, self.lng);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = self.cycle() => {}
            }
        }

        tracing::info!("[{}] 🛑 Detenido", self.tag_id());
    }

    /// Una vuelta completa: buscar, viajar, descansar.
    async fn cycle(&mut self) {
        let vehicles = match self.find_vehicles().await {
            Ok(vehicles) => vehicles,
            Err(e) => {
                tracing::warn!("[{}] ❌ Error buscando vehículos: {}", self.tag_id(), e);
                sleep(RETRY_DELAY).await;
                return;
            }
        };

        let Some(vehicle_id) = pick_nearest(&vehicles, self.lat, self.lng) else {
            self.stroll();
            tracing::debug!(
                "[{}] 🔍 Sin vehículos cerca, paseo hasta ({:.5}, {:.5})",
                self.tag_id(),
                self.lat,
                self.lng
            );
            sleep(NO_VEHICLES_REST).await;
            return;
        };

        sleep(PRE_RIDE_DELAY).await;

        if let Err(e) = self.start_ride(vehicle_id).await {
            tracing::warn!("[{}] ❌ Error iniciando viaje: {}", self.tag_id(), e);
            sleep(RETRY_DELAY).await;
            return;
        }
        tracing::debug!("[{}] 🚀 Viaje iniciado en {}", self.tag_id(), vehicle_id);

        let trip = Duration::from_secs(self.rng.gen_range(TRIP_SECS));
        let started = Instant::now();
        while started.elapsed() < trip {
            let lat = self.lat + self.jitter();
            let lng = self.lng + self.jitter();
            if let Err(e) = self.update_location(vehicle_id, lat, lng).await {
                tracing::warn!("[{}] ❌ Error actualizando ubicación: {}", self.tag_id(), e);
            } else {
                tracing::debug!("[{}] 📍 Ubicación ({:.5}, {:.5})", self.tag_id(), lat, lng);
            }
            sleep(LOCATION_INTERVAL).await;
        }

        match self.stop_ride(vehicle_id).await {
            Ok(()) => tracing::debug!("[{}] 🏁 Viaje terminado en {}", self.tag_id(), vehicle_id),
            Err(e) => tracing::warn!("[{}] ❌ Error terminando viaje: {}", self.tag_id(), e),
        }

        let rest = Duration::from_secs(self.rng.gen_range(REST_SECS));
        sleep(rest).await;
    }

    fn jitter(&mut self) -> f64 {
        self.rng.gen_range(-JITTER_DEG..=JITTER_DEG)
    }

    fn stroll(&mut self) {
        self.lat += self.jitter();
        self.lng += self.jitter();
    }
}

/// El más cercano a `(lat, lng)`; la API no garantiza ningún orden.
pub fn pick_nearest(vehicles: &[Vehicle], lat: f64, lng: f64) -> Option<Uuid> {
    vehicles
        .iter()
        .filter(|v| !v.id.is_nil())
        .map(|v| (v.id, distance_meters(lat, lng, v.lat, v.lng)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle_at(lat: f64, lng: f64) -> Vehicle {
        Vehicle::new(VehicleStatus::Free, lat, lng)
    }

    #[test]
    fn test_pick_nearest_ignores_response_order() {
        let far = vehicle_at(45.4300, -75.7000);
        let near = vehicle_at(45.4201, -75.7001);
        let mid = vehicle_at(45.4230, -75.7020);

        let picked = pick_nearest(&[far, near.clone(), mid], 45.42, -75.70);
        assert_eq!(picked, Some(near.id));
    }

    #[test]
    fn test_pick_nearest_skips_nil_ids() {
        let mut nil = vehicle_at(45.42, -75.70);
        nil.id = Uuid::nil();
        let other = vehicle_at(45.43, -75.71);

        assert_eq!(pick_nearest(&[nil, other.clone()], 45.42, -75.70), Some(other.id));
        assert_eq!(pick_nearest(&[], 45.42, -75.70), None);
    }

    #[test]
    fn test_tag_id_format() {
        let client = SimClient::new("Ottawa", "k".into(), "http://localhost:8080/".into(), 45.42, -75.70).unwrap();
        let tag = client.tag_id();

        assert!(tag.starts_with("ottawa-"));
        assert_eq!(tag.len(), "ottawa-".len() + 8);
        assert!(client.id.to_string().ends_with(&tag["ottawa-".len()..]));
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_stroll_stays_within_jitter() {
        let mut client = SimClient::new("montreal", "k".into(), "http://localhost".into(), 45.5, -73.57).unwrap();
        for _ in 0..50 {
            let (lat, lng) = client.position();
            client.stroll();
            let (new_lat, new_lng) = client.position();
            assert!((new_lat - lat).abs() <= JITTER_DEG);
            assert!((new_lng - lng).abs() <= JITTER_DEG);
        }
    }
}
