//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación. El servicio de
//! telemetría es la máquina de estados que mueve a los vehículos según los
//! eventos reportados.

pub mod telemetry_service;

pub use telemetry_service::*;
