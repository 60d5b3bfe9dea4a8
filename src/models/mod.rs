//! Modelos del sistema
//!
//! Este módulo contiene los tipos de dominio de telemetría. Los nombres de
//! campo en JSON son los mismos para ambos backends de almacenamiento.

pub mod area;
pub mod event;
pub mod vehicle;

pub use area::{Area, Query};
pub use event::{Event, EventType};
pub use vehicle::{Vehicle, VehicleStatus};
