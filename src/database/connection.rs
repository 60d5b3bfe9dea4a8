//! Configuración de conexión a PostgreSQL
//!
//! Este módulo maneja la conexión a la base de datos PostgreSQL con PostGIS,
//! reintentando mientras la base de datos termina de arrancar.

use anyhow::{anyhow, Result};
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseConfig;

const MAX_RETRY_WAIT: Duration = Duration::from_secs(10);

/// Pool de conexiones de la aplicación
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Conectar con reintentos: espera `intento` segundos, con tope de 10s.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let attempts = config.connect_attempts.max(1);
        let masked = mask_database_url(&config.url);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match config.create_pool().await {
                Ok(pool) => {
                    tracing::info!("✅ Conectado a PostgreSQL en {}", masked);
                    return Ok(Self { pool });
                }
                Err(e) => {
                    let wait = retry_wait(attempt);
                    tracing::warn!(
                        "⚠️ Intento {} de conexión a PostgreSQL fallido, reintentando en {:?}: {}",
                        attempt,
                        wait,
                        e
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        Err(anyhow!(
            "postgres connection to {} failed after {} attempts: {}",
            masked,
            attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn retry_wait(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt)).min(MAX_RETRY_WAIT)
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    let Some(at_pos) = url.find('@') else {
        return url.to_string();
    };
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    if scheme_end + 3 > at_pos {
        return url.to_string();
    }

    format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
}
