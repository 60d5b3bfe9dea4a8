//! Generador de carga: riders simulados que usan la API por HTTP.

pub mod manager;
pub mod sim;

pub use manager::SimManager;
pub use sim::SimClient;
