//! DTOs de Vehicle
//!
//! Requests y responses de la API de vehículos. Los indicadores derivados
//! (cambio de aceite, registro por expirar) se calculan al construir la
//! response, nunca se persisten.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::{MaintenanceEntry, StatusHistoryEntry, Vehicle};

/// Request para crear un nuevo vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 200))]
    pub vehicle_descriptor: String,

    #[validate(length(min = 2, max = 50))]
    pub color: Option<String>,

    pub license_plate: Option<String>,

    #[validate(length(min = 2, max = 50))]
    pub state: Option<String>,

    pub vin: Option<String>,

    /// "jay" | "avis"
    pub source: String,

    /// Solo tiene sentido cuando source = avis
    pub mva_number: Option<String>,

    #[validate(range(min = 0))]
    pub current_mileage: Option<i64>,

    #[validate(range(min = 0))]
    pub next_oil_change_due_mileage: Option<i64>,

    pub registration_expiration: Option<NaiveDate>,
}

/// Request para actualizar campos de un vehículo existente
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 200))]
    pub vehicle_descriptor: Option<String>,

    #[validate(length(min = 2, max = 50))]
    pub color: Option<String>,

    pub license_plate: Option<String>,

    #[validate(length(min = 2, max = 50))]
    pub state: Option<String>,

    pub vin: Option<String>,

    pub mva_number: Option<String>,

    #[validate(range(min = 0))]
    pub current_mileage: Option<i64>,

    #[validate(range(min = 0))]
    pub next_oil_change_due_mileage: Option<i64>,

    pub registration_expiration: Option<NaiveDate>,
}

/// Request para cambiar el estado del vehículo. Los campos obligatorios
/// son Option para que su ausencia sea un error de validación del
/// controller y no un rechazo del deserializador.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeStatusRequest {
    /// "available" | "with_customer" | "maintenance" | "prospecting" |
    /// "unavailable" | "archived"
    pub new_status: Option<String>,
    pub mileage: Option<i64>,
    #[serde(default)]
    pub is_oil_change: bool,
    pub note: Option<String>,
    /// Requerido al pasar a with_customer
    pub customer_id: Option<Uuid>,
    /// Al pasar a prospecting; por defecto el usuario que ejecuta
    pub assigned_to: Option<Uuid>,
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Default, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<String>,
    pub source: Option<String>,
    /// Busca en descriptor y matrícula
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Indicador derivado para la UI
#[derive(Debug, Serialize)]
pub struct AttentionIndicator {
    pub severity: String,
    pub message: String,
}

/// Response de vehículo para la API
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: String,
    pub vehicle_descriptor: String,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub state: Option<String>,
    pub vin: Option<String>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mva_number: Option<String>,
    pub status: String,
    pub status_label: String,
    pub current_mileage: i64,
    pub next_oil_change_due_mileage: Option<i64>,
    pub miles_until_oil_change: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oil_change_indicator: Option<AttentionIndicator>,
    pub registration_expiration: Option<NaiveDate>,
    pub registration_expiring: bool,
    pub assigned_to: Option<String>,
    pub customer_id: Option<String>,
    pub assigned_at: Option<String>,
    pub assigned_by: Option<String>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub maintenance_history: Vec<MaintenanceEntry>,
    pub created_at: String,
    pub updated_at: String,
}

/// Response de vehículo para listados - sin historial
#[derive(Debug, Serialize)]
pub struct VehicleListResponse {
    pub id: String,
    pub vehicle_descriptor: String,
    pub license_plate: Option<String>,
    pub source: String,
    pub status: String,
    pub status_label: String,
    pub current_mileage: i64,
    pub miles_until_oil_change: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oil_change_indicator: Option<AttentionIndicator>,
    pub registration_expiring: bool,
    pub customer_id: Option<String>,
    pub updated_at: String,
}

fn oil_change_indicator(vehicle: &Vehicle) -> Option<AttentionIndicator> {
    let status = vehicle.oil_change_status();
    match (status.severity(), status.label()) {
        (Some(severity), Some(message)) => Some(AttentionIndicator {
            severity: severity.to_string(),
            message,
        }),
        _ => None,
    }
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        let today = Utc::now().date_naive();
        let indicator = oil_change_indicator(&vehicle);
        Self {
            id: vehicle.id.to_string(),
            miles_until_oil_change: vehicle.miles_until_oil_change(),
            oil_change_indicator: indicator,
            registration_expiring: vehicle.registration_expiring(today),
            vehicle_descriptor: vehicle.vehicle_descriptor,
            color: vehicle.color,
            license_plate: vehicle.license_plate,
            state: vehicle.state,
            vin: vehicle.vin,
            source: vehicle.source.as_str().to_string(),
            mva_number: vehicle.mva_number,
            status: vehicle.status.as_str().to_string(),
            status_label: vehicle.status.label().to_string(),
            current_mileage: vehicle.current_mileage,
            next_oil_change_due_mileage: vehicle.next_oil_change_due_mileage,
            registration_expiration: vehicle.registration_expiration,
            assigned_to: vehicle.assigned_to.map(|id| id.to_string()),
            customer_id: vehicle.customer_id.map(|id| id.to_string()),
            assigned_at: vehicle.assigned_at.map(|d| d.to_rfc3339()),
            assigned_by: vehicle.assigned_by.map(|id| id.to_string()),
            status_history: vehicle.status_history.0,
            maintenance_history: vehicle.maintenance_history.0,
            created_at: vehicle.created_at.to_rfc3339(),
            updated_at: vehicle.updated_at.to_rfc3339(),
        }
    }
}

impl From<Vehicle> for VehicleListResponse {
    fn from(vehicle: Vehicle) -> Self {
        let today = Utc::now().date_naive();
        let indicator = oil_change_indicator(&vehicle);
        Self {
            id: vehicle.id.to_string(),
            miles_until_oil_change: vehicle.miles_until_oil_change(),
            oil_change_indicator: indicator,
            registration_expiring: vehicle.registration_expiring(today),
            vehicle_descriptor: vehicle.vehicle_descriptor,
            license_plate: vehicle.license_plate,
            source: vehicle.source.as_str().to_string(),
            status: vehicle.status.as_str().to_string(),
            status_label: vehicle.status.label().to_string(),
            current_mileage: vehicle.current_mileage,
            customer_id: vehicle.customer_id.map(|id| id.to_string()),
            updated_at: vehicle.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssignedVehicleResponse {
    pub vehicle_id: String,
    pub descriptor: String,
    pub assigned_at: String,
    pub assigned_by: String,
}
