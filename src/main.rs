use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scooter_telemetry::clients::SimManager;
use scooter_telemetry::config::{EnvironmentConfig, StorageBackend};
use scooter_telemetry::database::DatabaseConnection;
use scooter_telemetry::repositories::seed::default_cities;
use scooter_telemetry::repositories::{
    MemoryTelemetryRepository, PgTelemetryRepository, TelemetryRepository,
};
use scooter_telemetry::routes::create_router;
use scooter_telemetry::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🛴 API de telemetría de patinetes");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;

    let repository = match build_repository(&config).await {
        Ok(repository) => repository,
        Err(e) => {
            error!("❌ Error inicializando el almacenamiento: {}", e);
            return Err(e);
        }
    };

    let state = AppState::new(repository, &config);
    let app = create_router(state, config.request_timeout);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /healthz");
    info!("   GET  /api/v1/vehicles?minLat&maxLat&minLng&maxLng&status");
    info!("   GET  /api/v1/vehicles/:id");
    info!("   PUT  /api/v1/vehicles/:id");
    info!("   POST /api/v1/events");

    // Riders simulados
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let riders = if config.simulation.total_clients() > 0 {
        let api_key = config.api_keys.first().cloned().unwrap_or_default();
        let manager = SimManager::new(&config.simulation, &api_key)?;
        Some(tokio::spawn(manager.run(shutdown_rx)))
    } else {
        None
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = shutdown_tx.send(true);
    if let Some(riders) = riders {
        if let Err(e) = riders.await {
            error!("❌ Riders terminaron con error: {}", e);
        }
    }

    if let Err(e) = served {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Backend elegido por configuración, migrado y poblado si corresponde
async fn build_repository(config: &EnvironmentConfig) -> Result<Arc<dyn TelemetryRepository>> {
    let cities = default_cities();

    match config.storage_backend {
        StorageBackend::Memory => {
            let repository = MemoryTelemetryRepository::new();
            if config.seed_on_start {
                let seeded = repository.seed(&cities).await;
                info!("🛴 {} vehículos de demo en memoria", seeded);
            }
            Ok(Arc::new(repository))
        }
        StorageBackend::Postgres => {
            let connection = DatabaseConnection::connect(&config.database).await?;
            let repository = PgTelemetryRepository::new(connection.pool().clone());
            repository.migrate().await?;
            if config.seed_on_start {
                let seeded = repository.seed(&cities).await?;
                info!("🛴 {} vehículos de demo en PostgreSQL", seeded);
            }
            Ok(Arc::new(repository))
        }
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
