//! Fleet management backend
//!
//! API web de gestión de flota: vehículos, clientes y usuarios, con
//! máquina de estados de vehículo e historial append-only.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod utils;
