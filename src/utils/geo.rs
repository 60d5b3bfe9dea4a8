//! Utilidades geográficas
//!
//! Aproximación equirectangular: suficiente a escala de ciudad, no es
//! geodésicamente exacta cerca de los polos ni en distancias largas.

use crate::models::Area;

/// Metros por grado de latitud (aproximadamente constante)
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Desplazamiento en grados de latitud para una distancia en metros.
pub fn delta_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

/// Desplazamiento en grados de longitud para una distancia en metros a una
/// latitud dada.
pub fn delta_lng(meters: f64, lat: f64) -> f64 {
    meters / (METERS_PER_DEG_LAT * lat.to_radians().cos())
}

/// Envolvente rectangular alrededor de `(lat, lng)` con radio `radius_meters`.
pub fn bounding_box(lat: f64, lng: f64, radius_meters: f64) -> Area {
    let d_lat = delta_lat(radius_meters);
    let d_lng = delta_lng(radius_meters, lat);

    Area {
        min_lat: lat - d_lat,
        max_lat: lat + d_lat,
        min_lng: lng - d_lng,
        max_lng: lng + d_lng,
    }
}

/// Distancia aproximada en metros con la misma proyección que `bounding_box`.
pub fn distance_meters(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> f64 {
    let mean_lat = ((lat_a + lat_b) / 2.0).to_radians();
    let dy = (lat_b - lat_a) * METERS_PER_DEG_LAT;
    let dx = (lng_b - lng_a) * METERS_PER_DEG_LAT * mean_lat.cos();
    dx.hypot(dy)
}
