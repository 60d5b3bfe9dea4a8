//! DTOs de la API HTTP
//!
//! Formas de request que el router traduce a los tipos de dominio.

pub mod telemetry_dto;

pub use telemetry_dto::*;
