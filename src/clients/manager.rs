//! Arranque y parada conjunta de los riders simulados

use anyhow::Result;
use futures::future::join_all;
use rand::Rng;
use tokio::sync::watch;

use super::sim::SimClient;
use crate::config::SimulationConfig;
use crate::models::Area;

/// Centro de Ottawa, donde aparecen los riders
pub const OTTAWA_DOWNTOWN: Area = Area {
    min_lat: 45.40,
    max_lat: 45.44,
    min_lng: -75.72,
    max_lng: -75.68,
};

/// Centro de Montreal
pub const MONTREAL_DOWNTOWN: Area = Area {
    min_lat: 45.49,
    max_lat: 45.52,
    min_lng: -73.59,
    max_lng: -73.55,
};

pub struct SimManager {
    clients: Vec<SimClient>,
}

impl SimManager {
    pub fn new(config: &SimulationConfig, api_key: &str) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let cities = [
            ("ottawa", config.ottawa_clients, OTTAWA_DOWNTOWN),
            ("montreal", config.montreal_clients, MONTREAL_DOWNTOWN),
        ];

        let mut clients = Vec::with_capacity(config.total_clients());
        for (tag, count, area) in cities {
            for _ in 0..count {
                let (lat, lng) = random_point(&area, &mut rng);
                clients.push(SimClient::new(
                    tag,
                    api_key.to_string(),
                    config.api_url.clone(),
                    lat,
                    lng,
                )?);
            }
        }

        Ok(Self { clients })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Ejecuta todos los riders hasta que `shutdown` se active.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        tracing::info!("🛴 Iniciando {} riders simulados", self.clients.len());

        join_all(
            self.clients
                .into_iter()
                .map(|client| client.run(shutdown.clone())),
        )
        .await;

        tracing::info!("🛑 Riders simulados detenidos");
    }
}

fn random_point<R: Rng + ?Sized>(area: &Area, rng: &mut R) -> (f64, f64) {
    (
        rng.gen_range(area.min_lat..=area.max_lat),
        rng.gen_range(area.min_lng..=area.max_lng),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sim_config(ottawa: usize, montreal: usize) -> SimulationConfig {
        SimulationConfig {
            ottawa_clients: ottawa,
            montreal_clients: montreal,
            api_url: "http://127.0.0.1:8080".to_string(),
        }
    }

    #[test]
    fn test_manager_spawns_riders_inside_downtown() {
        let manager = SimManager::new(&sim_config(3, 4), "demo-api-key").unwrap();
        assert_eq!(manager.len(), 7);

        for client in &manager.clients {
            let (lat, lng) = client.position();
            let tag = client.tag_id();
            if tag.starts_with("ottawa-") {
                assert!(OTTAWA_DOWNTOWN.contains(lat, lng));
            } else {
                assert!(tag.starts_with("montreal-"));
                assert!(MONTREAL_DOWNTOWN.contains(lat, lng));
            }
        }
    }

    #[tokio::test]
    async fn test_run_returns_once_shutdown_is_signalled() {
        // puerto 9 (discard) en loopback: cada petición falla enseguida y el
        // rider queda en su bucle de reintentos
        let mut config = sim_config(1, 1);
        config.api_url = "http://127.0.0.1:9".to_string();
        let manager = SimManager::new(&config, "demo-api-key").unwrap();
        assert_eq!(manager.len(), 2);

        let (tx, rx) = watch::channel(false);
        let riders = tokio::spawn(manager.run(rx));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!riders.is_finished());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), riders)
            .await
            .expect("riders did not stop after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_is_dropped() {
        let mut config = sim_config(1, 0);
        config.api_url = "http://127.0.0.1:9".to_string();
        let manager = SimManager::new(&config, "demo-api-key").unwrap();

        let (tx, rx) = watch::channel(false);
        let riders = tokio::spawn(manager.run(rx));
        drop(tx);

        tokio::time::timeout(Duration::from_secs(2), riders)
            .await
            .expect("riders did not stop after the sender was dropped")
            .unwrap();
    }
}
