//! DTOs de Customer

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::AssignedVehicleResponse;
use crate::models::customer::{Customer, CustomerHistoryEntry};

/// Request para crear un customer
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(email)]
    pub email: Option<String>,

    pub phone: Option<String>,
}

/// Request para actualizar campos de un customer
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub phone: Option<String>,
}

/// Request para compartir un customer con otro usuario
#[derive(Debug, Deserialize)]
pub struct ShareCustomerRequest {
    pub user_id: Uuid,
}

/// Request para añadir una nota al historial
#[derive(Debug, Deserialize, Validate)]
pub struct AddNoteRequest {
    #[validate(length(min = 1, max = 2000))]
    pub note: String,
}

/// Request para asignar un vehículo al customer
#[derive(Debug, Deserialize)]
pub struct AssignVehicleRequest {
    pub vehicle_id: Uuid,
    /// Descriptor denormalizado; si falta se toma del vehículo
    pub descriptor: Option<String>,
}

/// Response de customer para la API
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub primary_owner_id: String,
    pub additional_owner_ids: Vec<String>,
    pub assigned_vehicles: Vec<AssignedVehicleResponse>,
    pub assigned_vehicle_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        let assigned: Vec<AssignedVehicleResponse> = customer
            .assigned_vehicles
            .0
            .into_iter()
            .map(|v| AssignedVehicleResponse {
                vehicle_id: v.vehicle_id.to_string(),
                descriptor: v.descriptor,
                assigned_at: v.assigned_at.to_rfc3339(),
                assigned_by: v.assigned_by.to_string(),
            })
            .collect();

        Self {
            id: customer.id.to_string(),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            primary_owner_id: customer.primary_owner_id.to_string(),
            additional_owner_ids: customer
                .additional_owner_ids
                .iter()
                .map(|id| id.to_string())
                .collect(),
            assigned_vehicle_count: assigned.len(),
            assigned_vehicles: assigned,
            created_at: customer.created_at.to_rfc3339(),
            updated_at: customer.updated_at.to_rfc3339(),
        }
    }
}

/// Entrada del historial para la API
#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    pub id: String,
    pub entry_type: String,
    pub description: String,
    pub user_id: String,
    pub user_name: String,
    pub created_at: String,
}

impl From<CustomerHistoryEntry> for HistoryEntryResponse {
    fn from(entry: CustomerHistoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            entry_type: match entry.entry_type {
                crate::models::customer::HistoryEntryType::Update => "update",
                crate::models::customer::HistoryEntryType::Share => "share",
                crate::models::customer::HistoryEntryType::Vehicle => "vehicle",
                crate::models::customer::HistoryEntryType::Note => "note",
            }
            .to_string(),
            description: entry.description,
            user_id: entry.user_id.to_string(),
            user_name: entry.user_name,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}
