//! Datos de demo para poblar la flota
//!
//! Posiciones uniformes dentro de la envolvente de cada ciudad; el 60% de los
//! vehículos arranca ocupado.

use rand::Rng;

use crate::models::{Area, Vehicle, VehicleStatus};

const OCCUPIED_RATIO: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct CitySeed {
    pub name: &'static str,
    pub count: usize,
    pub area: Area,
}

/// Ciudades de demo: Ottawa y Montreal
pub fn default_cities() -> Vec<CitySeed> {
    vec![
        CitySeed {
            name: "Ottawa",
            count: 3216,
            area: Area {
                min_lat: 45.17927019403111,
                max_lat: 45.4502599310963,
                min_lng: -75.95781905735376,
                max_lng: -75.37765015636133,
            },
        },
        CitySeed {
            name: "Montreal",
            count: 5376,
            area: Area {
                min_lat: 45.452507945877,
                max_lat: 45.62109228798646,
                min_lng: -73.63465335011105,
                max_lng: -73.55019903119938,
            },
        },
    ]
}

/// Genera `city.count` vehículos aleatorios dentro del área de la ciudad.
pub fn generate_vehicles<R: Rng + ?Sized>(city: &CitySeed, rng: &mut R) -> Vec<Vehicle> {
    let area = &city.area;

    (0..city.count)
        .map(|_| {
            let status = if rng.gen::<f64>() < OCCUPIED_RATIO {
                VehicleStatus::Occupied
            } else {
                VehicleStatus::Free
            };
            let lat = area.min_lat + rng.gen::<f64>() * (area.max_lat - area.min_lat);
            let lng = area.min_lng + rng.gen::<f64>() * (area.max_lng - area.min_lng);

            Vehicle::new(status, lat, lng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_vehicles_stay_inside_city() {
        let mut rng = StdRng::seed_from_u64(7);
        for city in default_cities() {
            let vehicles = generate_vehicles(&city, &mut rng);
            assert_eq!(vehicles.len(), city.count);
            assert!(vehicles.iter().all(|v| city.area.contains(v.lat, v.lng)));
        }
    }

    #[test]
    fn test_status_mix_is_roughly_sixty_percent_occupied() {
        let mut rng = StdRng::seed_from_u64(42);
        let city = CitySeed {
            name: "Test",
            count: 10_000,
            area: Area::new(0.0, 1.0, 0.0, 1.0),
        };

        let vehicles = generate_vehicles(&city, &mut rng);
        let occupied = vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Occupied)
            .count();

        let ratio = occupied as f64 / vehicles.len() as f64;
        assert!((0.55..0.65).contains(&ratio), "ratio was {ratio}");
    }
}
