//! Modelo de Customer
//!
//! Clientes de la flota. Cada customer tiene un owner principal (el
//! creador, único que puede borrarlo o compartirlo) y owners adicionales
//! con acceso de lectura/gestión. El historial es un audit log
//! append-only en su propia tabla.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::user::ActingUser;
use crate::utils::errors::{forbidden_error, AppError};

/// Registro de un vehículo asignado al customer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignedVehicle {
    pub vehicle_id: Uuid,
    pub descriptor: String,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Uuid,
}

/// Customer principal - mapea exactamente a la tabla customers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub primary_owner_id: Uuid,
    pub additional_owner_ids: Vec<Uuid>,
    pub assigned_vehicles: Json<Vec<AssignedVehicle>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Visible para el owner principal, los owners adicionales y admins
    pub fn can_view(&self, acting: &ActingUser) -> bool {
        acting.is_admin()
            || self.primary_owner_id == acting.id
            || self.additional_owner_ids.contains(&acting.id)
    }

    pub fn is_primary_owner(&self, acting: &ActingUser) -> bool {
        self.primary_owner_id == acting.id
    }

    pub fn has_vehicle(&self, vehicle_id: Uuid) -> bool {
        self.assigned_vehicles
            .0
            .iter()
            .any(|v| v.vehicle_id == vehicle_id)
    }

    /// El borrado exige ser owner principal y no tener vehículos asignados
    pub fn check_delete(&self, acting: &ActingUser) -> Result<(), AppError> {
        if !self.is_primary_owner(acting) {
            return Err(forbidden_error(
                "delete customer",
                "only the primary owner may delete a customer",
            ));
        }
        if !self.assigned_vehicles.0.is_empty() {
            return Err(AppError::Conflict(format!(
                "Customer has {} assigned vehicle(s) and cannot be deleted",
                self.assigned_vehicles.0.len()
            )));
        }
        Ok(())
    }
}

/// Tipo de entrada del historial del customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "customer_history_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryEntryType {
    Update,
    Share,
    Vehicle,
    Note,
}

/// Fila del audit log - mapea a la tabla customer_history
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerHistoryEntry {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub entry_type: HistoryEntryType,
    pub description: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn acting(id: Uuid, role: UserRole) -> ActingUser {
        ActingUser {
            id,
            display_name: "Test".to_string(),
            email: "test@fleet.test".to_string(),
            role,
        }
    }

    fn customer(owner: Uuid, vehicles: Vec<AssignedVehicle>) -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            name: "Jane Doe".to_string(),
            email: Some("jane@x.com".to_string()),
            phone: Some("5551234567".to_string()),
            primary_owner_id: owner,
            additional_owner_ids: Vec::new(),
            assigned_vehicles: Json(vehicles),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_delete_blocked_with_assigned_vehicles() {
        let owner = Uuid::new_v4();
        let c = customer(
            owner,
            vec![AssignedVehicle {
                vehicle_id: Uuid::new_v4(),
                descriptor: "2022 Toyota Camry".to_string(),
                assigned_at: Utc::now(),
                assigned_by: owner,
            }],
        );
        let err = c.check_delete(&acting(owner, UserRole::Rep)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_delete_forbidden_for_non_owner() {
        let c = customer(Uuid::new_v4(), Vec::new());
        let err = c
            .check_delete(&acting(Uuid::new_v4(), UserRole::Admin))
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_delete_allowed_for_owner_without_vehicles() {
        let owner = Uuid::new_v4();
        let c = customer(owner, Vec::new());
        assert!(c.check_delete(&acting(owner, UserRole::Rep)).is_ok());
    }

    #[test]
    fn test_visibility() {
        let owner = Uuid::new_v4();
        let shared = Uuid::new_v4();
        let mut c = customer(owner, Vec::new());
        c.additional_owner_ids.push(shared);

        assert!(c.can_view(&acting(owner, UserRole::Rep)));
        assert!(c.can_view(&acting(shared, UserRole::Rep)));
        assert!(c.can_view(&acting(Uuid::new_v4(), UserRole::Admin)));
        assert!(!c.can_view(&acting(Uuid::new_v4(), UserRole::Rep)));
    }
}
