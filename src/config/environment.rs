//! Configuración de variables de entorno
//!
//! Este módulo lee la configuración del proceso. Cada variable tiene un valor
//! por defecto; un valor presente pero mal formado es un error de arranque.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::database::DatabaseConfig;

/// Backend de almacenamiento elegido al arrancar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "postgres" | "pg" => Ok(StorageBackend::Postgres),
            other => Err(anyhow!("unknown storage backend '{}'", other)),
        }
    }
}

/// Riders simulados por ciudad
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub ottawa_clients: usize,
    pub montreal_clients: usize,
    pub api_url: String,
}

impl SimulationConfig {
    pub fn total_clients(&self) -> usize {
        self.ottawa_clients + self.montreal_clients
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    pub storage_backend: StorageBackend,
    pub seed_on_start: bool,
    pub request_timeout: Duration,
    pub database: DatabaseConfig,
    pub simulation: SimulationConfig,
}

impl EnvironmentConfig {
    /// Lee la configuración del entorno del proceso.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 8080)?;

        let api_keys: Vec<String> = lookup("API_KEYS")
            .unwrap_or_else(|| "demo-api-key".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if api_keys.is_empty() {
            return Err(anyhow!("API_KEYS must contain at least one key"));
        }

        let simulation = SimulationConfig {
            ottawa_clients: parse_or(&lookup, "SIM_OTTAWA_CLIENTS", 1)?,
            montreal_clients: parse_or(&lookup, "SIM_MONTREAL_CLIENTS", 2)?,
            api_url: lookup("SIM_API_URL").unwrap_or_else(|| format!("http://127.0.0.1:{}", port)),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            api_keys,
            storage_backend: parse_or(&lookup, "STORAGE_BACKEND", StorageBackend::Memory)?,
            seed_on_start: parse_or(&lookup, "SEED_ON_START", true)?,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10)?),
            database: DatabaseConfig::from_lookup(&lookup)?,
            simulation,
        })
    }

    /// Obtener la dirección del servidor
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parsea `key` si está presente; si no, devuelve `default`.
pub(crate) fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}
