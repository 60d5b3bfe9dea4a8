//! Backend PostgreSQL + PostGIS
//!
//! El control de concurrencia lo hace la base de datos. Las consultas viven
//! en un `TelemetryQueries` construido una sola vez junto al repositorio.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::seed::{generate_vehicles, CitySeed};
use super::TelemetryRepository;
use crate::models::{Area, Event, Vehicle, VehicleStatus};
use crate::utils::errors::{not_found_error, AppError};

/// Texto SQL del backend relacional
#[derive(Debug, Clone)]
pub struct TelemetryQueries {
    pub get_vehicle: &'static str,
    pub upsert_vehicle: &'static str,
    pub find_vehicles_in_area: &'static str,
    pub store_event: &'static str,
    pub count_vehicles: &'static str,
    pub migrations: &'static [&'static str],
}

impl Default for TelemetryQueries {
    fn default() -> Self {
        Self {
            get_vehicle: "SELECT id, status, lat, lng, updated_at FROM vehicles WHERE id = $1",
            upsert_vehicle: r#"
            INSERT INTO vehicles (id, status, lat, lng, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET status = EXCLUDED.status, lat = EXCLUDED.lat, lng = EXCLUDED.lng, updated_at = EXCLUDED.updated_at
            "#,
            // ST_Covers incluye los puntos sobre el borde del rectángulo
            find_vehicles_in_area: r#"
            SELECT id, status, lat, lng, updated_at
            FROM vehicles
            WHERE status = $1
              AND ST_Covers(
                ST_MakeEnvelope($2, $3, $4, $5, 4326),
                ST_SetSRID(ST_MakePoint(lng, lat), 4326)
              )
            "#,
            store_event: r#"
            INSERT INTO events (id, vehicle_id, type, timestamp, lat, lng)
            VALUES ($1, $2, $3, COALESCE($4, now()), $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
            count_vehicles: "SELECT COUNT(*) FROM vehicles",
            migrations: &[
                "CREATE EXTENSION IF NOT EXISTS postgis",
                r#"
                CREATE TABLE IF NOT EXISTS vehicles (
                    id UUID PRIMARY KEY,
                    status TEXT NOT NULL,
                    lat DOUBLE PRECISION NOT NULL,
                    lng DOUBLE PRECISION NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS events (
                    id UUID PRIMARY KEY,
                    vehicle_id UUID NOT NULL,
                    type TEXT NOT NULL,
                    timestamp TIMESTAMPTZ NOT NULL,
                    lat DOUBLE PRECISION NOT NULL,
                    lng DOUBLE PRECISION NOT NULL
                )
                "#,
            ],
        }
    }
}

/// Fila tal y como sale de la tabla vehicles
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    status: String,
    lat: f64,
    lng: f64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<VehicleStatus>()
            .map_err(|e| AppError::Internal(format!("Corrupt vehicle row {}: {}", row.id, e)))?;

        Ok(Vehicle {
            id: row.id,
            status,
            lat: row.lat,
            lng: row.lng,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgTelemetryRepository {
    pool: PgPool,
    queries: TelemetryQueries,
}

impl PgTelemetryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_queries(pool, TelemetryQueries::default())
    }

    pub fn with_queries(pool: PgPool, queries: TelemetryQueries) -> Self {
        Self { pool, queries }
    }

    /// Crea la extensión PostGIS y las tablas si no existen.
    pub async fn migrate(&self) -> Result<(), AppError> {
        for statement in self.queries.migrations {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        tracing::info!("✅ Migraciones de telemetría aplicadas");
        Ok(())
    }

    /// Inserta la flota de demo salvo que la tabla ya tenga vehículos.
    pub async fn seed(&self, cities: &[CitySeed]) -> Result<usize, AppError> {
        let (existing,): (i64,) = sqlx::query_as(self.queries.count_vehicles)
            .fetch_one(&self.pool)
            .await?;

        if existing > 0 {
            tracing::info!("🛴 Ya hay {} vehículos guardados, se omite el seed", existing);
            return Ok(0);
        }

        let vehicles: Vec<Vehicle> = {
            let mut rng = rand::thread_rng();
            cities
                .iter()
                .flat_map(|city| generate_vehicles(city, &mut rng))
                .collect()
        };

        let mut tx = self.pool.begin().await?;
        for vehicle in &vehicles {
            sqlx::query(self.queries.upsert_vehicle)
                .bind(vehicle.id)
                .bind(vehicle.status.as_str())
                .bind(vehicle.lat)
                .bind(vehicle.lng)
                .bind(vehicle.updated_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!("🛴 {} vehículos generados en PostgreSQL", vehicles.len());
        Ok(vehicles.len())
    }
}

#[async_trait]
impl TelemetryRepository for PgTelemetryRepository {
    async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, AppError> {
        let row = sqlx::query_as::<_, VehicleRow>(self.queries.get_vehicle)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        Vehicle::try_from(row)
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), AppError> {
        sqlx::query(self.queries.upsert_vehicle)
            .bind(vehicle.id)
            .bind(vehicle.status.as_str())
            .bind(vehicle.lat)
            .bind(vehicle.lng)
            .bind(vehicle.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_vehicles_in_area(
        &self,
        area: &Area,
        status: VehicleStatus,
    ) -> Result<Vec<Vehicle>, AppError> {
        // ST_MakeEnvelope(xmin, ymin, xmax, ymax): x es longitud
        let rows = sqlx::query_as::<_, VehicleRow>(self.queries.find_vehicles_in_area)
            .bind(status.as_str())
            .bind(area.min_lng)
            .bind(area.min_lat)
            .bind(area.max_lng)
            .bind(area.max_lat)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn store_event(&self, event: &Event) -> Result<(), AppError> {
        sqlx::query(self.queries.store_event)
            .bind(event.id)
            .bind(event.vehicle_id)
            .bind(event.event_type.as_str())
            .bind(event.timestamp)
            .bind(event.lat)
            .bind(event.lng)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
