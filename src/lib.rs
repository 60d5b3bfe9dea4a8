//! Servicio de telemetría de patinetes
//!
//! Expone los módulos para que el binario y los tests de integración
//! construyan el mismo router.

pub mod clients;
pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
