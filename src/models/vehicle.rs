//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, la máquina de estados del
//! vehículo y las reglas puras del historial (status + mantenimiento).
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::{validation_error, AppError};

/// Intervalo fijo entre cambios de aceite (millas)
pub const OIL_CHANGE_INTERVAL_MILES: i64 = 5000;

/// Umbral de aviso "due soon" para el cambio de aceite (millas)
pub const OIL_CHANGE_WARNING_MILES: i64 = 500;

/// Ventana de aviso para la expiración del registro (meses)
pub const REGISTRATION_WARNING_MONTHS: u32 = 2;

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    WithCustomer,
    Maintenance,
    Prospecting,
    Unavailable,
    Archived,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::WithCustomer => "with_customer",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Prospecting => "prospecting",
            VehicleStatus::Unavailable => "unavailable",
            VehicleStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(VehicleStatus::Available),
            "with_customer" => Some(VehicleStatus::WithCustomer),
            "maintenance" => Some(VehicleStatus::Maintenance),
            "prospecting" => Some(VehicleStatus::Prospecting),
            "unavailable" => Some(VehicleStatus::Unavailable),
            "archived" => Some(VehicleStatus::Archived),
            _ => None,
        }
    }

    /// Etiqueta legible para el historial y las respuestas
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::WithCustomer => "With Customer",
            VehicleStatus::Maintenance => "Maintenance",
            VehicleStatus::Prospecting => "Prospecting",
            VehicleStatus::Unavailable => "Unavailable",
            VehicleStatus::Archived => "Archived",
        }
    }

    /// Tabla de transiciones. El grafo es permisivo salvo para vehículos
    /// archivados: un vehículo archivado solo puede reactivarse a Available.
    pub fn can_transition_to(&self, target: VehicleStatus) -> bool {
        match self {
            VehicleStatus::Archived => target == VehicleStatus::Available,
            _ => true,
        }
    }
}

/// Origen del vehículo - mapea al ENUM vehicle_source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleSource {
    Jay,
    Avis,
}

impl VehicleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleSource::Jay => "jay",
            VehicleSource::Avis => "avis",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "jay" => Some(VehicleSource::Jay),
            "avis" => Some(VehicleSource::Avis),
            _ => None,
        }
    }
}

/// Entrada del historial de estados (append-only, nunca se edita)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusHistoryEntry {
    pub previous_status: VehicleStatus,
    pub new_status: VehicleStatus,
    pub date: DateTime<Utc>,
    pub mileage: i64,
    pub user_id: Uuid,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Tipo de entrada de mantenimiento
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceType {
    OilChange,
    Other,
}

/// Entrada del historial de mantenimiento (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceEntry {
    pub maintenance_type: MaintenanceType,
    pub date: DateTime<Utc>,
    pub mileage: i64,
    pub user_id: Uuid,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub vehicle_descriptor: String,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub state: Option<String>,
    pub vin: Option<String>,
    pub source: VehicleSource,
    pub mva_number: Option<String>,
    pub status: VehicleStatus,
    pub current_mileage: i64,
    pub next_oil_change_due_mileage: Option<i64>,
    pub registration_expiration: Option<NaiveDate>,
    pub status_history: Json<Vec<StatusHistoryEntry>>,
    pub maintenance_history: Json<Vec<MaintenanceEntry>>,
    pub assigned_to: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Millas restantes hasta el próximo cambio de aceite (derivado)
    pub fn miles_until_oil_change(&self) -> Option<i64> {
        self.next_oil_change_due_mileage
            .map(|due| due - self.current_mileage)
    }

    /// Indicador derivado de cambio de aceite (nunca se persiste)
    pub fn oil_change_status(&self) -> OilChangeStatus {
        oil_change_status(self.miles_until_oil_change())
    }

    /// Indicador derivado de registro por expirar (nunca se persiste)
    pub fn registration_expiring(&self, today: NaiveDate) -> bool {
        match self.registration_expiration {
            Some(expiration) => registration_expiring_soon(expiration, today),
            None => false,
        }
    }
}

/// Indicador derivado del estado del cambio de aceite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OilChangeStatus {
    None,
    /// 0 < millas restantes <= umbral de aviso
    Due { miles_remaining: i64 },
    /// millas restantes <= 0
    Overdue { miles_over: i64 },
}

impl OilChangeStatus {
    /// Severidad para la UI: "warning" o "error"
    pub fn severity(&self) -> Option<&'static str> {
        match self {
            OilChangeStatus::None => None,
            OilChangeStatus::Due { .. } => Some("warning"),
            OilChangeStatus::Overdue { .. } => Some("error"),
        }
    }

    pub fn label(&self) -> Option<String> {
        match self {
            OilChangeStatus::None => None,
            OilChangeStatus::Due { miles_remaining } => {
                Some(format!("due in {} miles", miles_remaining))
            }
            OilChangeStatus::Overdue { miles_over } => {
                Some(format!("overdue by {} miles", miles_over))
            }
        }
    }
}

/// Calcular el indicador de cambio de aceite a partir de las millas restantes
pub fn oil_change_status(miles_until: Option<i64>) -> OilChangeStatus {
    match miles_until {
        None => OilChangeStatus::None,
        Some(miles) if miles > OIL_CHANGE_WARNING_MILES => OilChangeStatus::None,
        Some(miles) if miles > 0 => OilChangeStatus::Due {
            miles_remaining: miles,
        },
        Some(miles) => OilChangeStatus::Overdue { miles_over: -miles },
    }
}

/// Registro por expirar: true cuando la expiración cae dentro de la ventana
/// de aviso (incluye registros ya expirados)
pub fn registration_expiring_soon(expiration: NaiveDate, today: NaiveDate) -> bool {
    match today.checked_add_months(Months::new(REGISTRATION_WARNING_MONTHS)) {
        Some(threshold) => expiration <= threshold,
        None => false,
    }
}

/// Input de una transición de estado
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub new_status: VehicleStatus,
    pub mileage: i64,
    pub user_id: Uuid,
    pub user_name: String,
    pub is_oil_change: bool,
    pub note: Option<String>,
}

/// Resultado puro de aplicar una transición. El repositorio persiste
/// todos los campos en un único UPDATE.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub status: VehicleStatus,
    pub current_mileage: i64,
    pub next_oil_change_due_mileage: Option<i64>,
    pub status_entry: StatusHistoryEntry,
    pub maintenance_entry: Option<MaintenanceEntry>,
}

/// Aplicar una transición de estado sobre el vehículo actual.
///
/// Reglas:
/// - la transición debe estar permitida por la tabla de estados
/// - el kilometraje no puede retroceder
/// - toda transición genera exactamente una entrada de status_history
/// - un cambio de aceite genera exactamente una entrada de
///   maintenance_history y reinicia el intervalo a 5000 millas
pub fn apply_transition(
    vehicle: &Vehicle,
    transition: &StatusTransition,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, AppError> {
    if transition.mileage < 0 {
        return Err(validation_error("mileage", "mileage must be non-negative"));
    }

    if transition.mileage < vehicle.current_mileage {
        return Err(validation_error(
            "mileage",
            "mileage cannot be lower than the recorded mileage",
        ));
    }

    if !vehicle.status.can_transition_to(transition.new_status) {
        return Err(validation_error(
            "status",
            "archived vehicles can only be reactivated to available",
        ));
    }

    let status_entry = StatusHistoryEntry {
        previous_status: vehicle.status,
        new_status: transition.new_status,
        date: now,
        mileage: transition.mileage,
        user_id: transition.user_id,
        user_name: transition.user_name.clone(),
        note: transition.note.clone(),
    };

    let (maintenance_entry, next_due) = if transition.is_oil_change {
        let entry = MaintenanceEntry {
            maintenance_type: MaintenanceType::OilChange,
            date: now,
            mileage: transition.mileage,
            user_id: transition.user_id,
            user_name: transition.user_name.clone(),
            note: transition.note.clone(),
        };
        (
            Some(entry),
            Some(transition.mileage + OIL_CHANGE_INTERVAL_MILES),
        )
    } else {
        (None, vehicle.next_oil_change_due_mileage)
    };

    Ok(TransitionOutcome {
        status: transition.new_status,
        current_mileage: transition.mileage,
        next_oil_change_due_mileage: next_due,
        status_entry,
        maintenance_entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vehicle(status: VehicleStatus, mileage: i64, next_due: Option<i64>) -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            vehicle_descriptor: "2022 Toyota Camry".to_string(),
            color: Some("Silver".to_string()),
            license_plate: Some("ABC1234".to_string()),
            state: Some("NY".to_string()),
            vin: None,
            source: VehicleSource::Jay,
            mva_number: None,
            status,
            current_mileage: mileage,
            next_oil_change_due_mileage: next_due,
            registration_expiration: None,
            status_history: Json(Vec::new()),
            maintenance_history: Json(Vec::new()),
            assigned_to: None,
            customer_id: None,
            assigned_at: None,
            assigned_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_transition(new_status: VehicleStatus, mileage: i64, oil: bool) -> StatusTransition {
        StatusTransition {
            new_status,
            mileage,
            user_id: Uuid::new_v4(),
            user_name: "Test User".to_string(),
            is_oil_change: oil,
            note: None,
        }
    }

    #[test]
    fn test_oil_change_status_boundaries() {
        assert_eq!(oil_change_status(None), OilChangeStatus::None);
        assert_eq!(oil_change_status(Some(501)), OilChangeStatus::None);
        assert_eq!(
            oil_change_status(Some(500)),
            OilChangeStatus::Due {
                miles_remaining: 500
            }
        );
        assert_eq!(
            oil_change_status(Some(1)),
            OilChangeStatus::Due { miles_remaining: 1 }
        );
        assert_eq!(
            oil_change_status(Some(0)),
            OilChangeStatus::Overdue { miles_over: 0 }
        );
        assert_eq!(
            oil_change_status(Some(-250)),
            OilChangeStatus::Overdue { miles_over: 250 }
        );
    }

    #[test]
    fn test_oil_change_status_labels() {
        assert_eq!(oil_change_status(Some(501)).label(), None);
        assert_eq!(
            oil_change_status(Some(500)).label().as_deref(),
            Some("due in 500 miles")
        );
        assert_eq!(
            oil_change_status(Some(0)).label().as_deref(),
            Some("overdue by 0 miles")
        );
        assert_eq!(oil_change_status(Some(500)).severity(), Some("warning"));
        assert_eq!(oil_change_status(Some(0)).severity(), Some("error"));
    }

    #[test]
    fn test_registration_expiring_window() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        // dentro de la ventana de 2 meses
        assert!(registration_expiring_soon(
            NaiveDate::from_ymd_opt(2025, 5, 15).unwrap(),
            today
        ));
        // ya expirado cuenta como aviso
        assert!(registration_expiring_soon(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            today
        ));
        // fuera de la ventana
        assert!(!registration_expiring_soon(
            NaiveDate::from_ymd_opt(2025, 5, 16).unwrap(),
            today
        ));
    }

    #[test]
    fn test_transition_appends_exactly_one_status_entry() {
        let vehicle = test_vehicle(VehicleStatus::Available, 10000, Some(15000));
        let transition = test_transition(VehicleStatus::Maintenance, 10200, false);
        let outcome = apply_transition(&vehicle, &transition, Utc::now()).unwrap();

        assert_eq!(outcome.status, VehicleStatus::Maintenance);
        assert_eq!(outcome.current_mileage, 10200);
        assert_eq!(outcome.status_entry.previous_status, VehicleStatus::Available);
        assert_eq!(outcome.status_entry.new_status, VehicleStatus::Maintenance);
        assert_eq!(outcome.status_entry.mileage, 10200);
        assert!(outcome.maintenance_entry.is_none());
        // sin cambio de aceite el intervalo no se toca
        assert_eq!(outcome.next_oil_change_due_mileage, Some(15000));
    }

    #[test]
    fn test_oil_change_resets_interval_and_appends_maintenance() {
        let vehicle = test_vehicle(VehicleStatus::Maintenance, 14600, Some(15000));
        let transition = test_transition(VehicleStatus::Available, 14700, true);
        let outcome = apply_transition(&vehicle, &transition, Utc::now()).unwrap();

        assert_eq!(outcome.next_oil_change_due_mileage, Some(19700));
        let entry = outcome.maintenance_entry.expect("maintenance entry");
        assert_eq!(entry.maintenance_type, MaintenanceType::OilChange);
        assert_eq!(entry.mileage, 14700);
    }

    #[test]
    fn test_mileage_cannot_decrease() {
        let vehicle = test_vehicle(VehicleStatus::Available, 10000, None);
        let transition = test_transition(VehicleStatus::Unavailable, 9999, false);
        assert!(apply_transition(&vehicle, &transition, Utc::now()).is_err());
    }

    #[test]
    fn test_archived_only_reactivates_to_available() {
        let vehicle = test_vehicle(VehicleStatus::Archived, 10000, None);

        let bad = test_transition(VehicleStatus::Prospecting, 10000, false);
        assert!(apply_transition(&vehicle, &bad, Utc::now()).is_err());

        let ok = test_transition(VehicleStatus::Available, 10000, false);
        assert!(apply_transition(&vehicle, &ok, Utc::now()).is_ok());
    }

    #[test]
    fn test_end_to_end_oil_change_flow() {
        // crear con 10000 millas y próximo cambio a 15000: derivado 5000
        let mut vehicle = test_vehicle(VehicleStatus::Available, 10000, Some(15000));
        assert_eq!(vehicle.miles_until_oil_change(), Some(5000));
        assert_eq!(vehicle.oil_change_status(), OilChangeStatus::None);

        // transición a 14600 sin cambio de aceite: "due in 400 miles"
        let t1 = test_transition(VehicleStatus::WithCustomer, 14600, false);
        let o1 = apply_transition(&vehicle, &t1, Utc::now()).unwrap();
        vehicle.status = o1.status;
        vehicle.current_mileage = o1.current_mileage;
        vehicle.next_oil_change_due_mileage = o1.next_oil_change_due_mileage;
        vehicle.status_history.0.push(o1.status_entry);

        assert_eq!(
            vehicle.oil_change_status(),
            OilChangeStatus::Due {
                miles_remaining: 400
            }
        );

        // cambio de aceite a 14700: intervalo reiniciado, una entrada nueva
        let t2 = test_transition(VehicleStatus::Available, 14700, true);
        let o2 = apply_transition(&vehicle, &t2, Utc::now()).unwrap();
        vehicle.status = o2.status;
        vehicle.current_mileage = o2.current_mileage;
        vehicle.next_oil_change_due_mileage = o2.next_oil_change_due_mileage;
        vehicle.status_history.0.push(o2.status_entry);
        vehicle
            .maintenance_history
            .0
            .push(o2.maintenance_entry.unwrap());

        assert_eq!(vehicle.next_oil_change_due_mileage, Some(19700));
        assert_eq!(vehicle.miles_until_oil_change(), Some(5000));
        assert_eq!(vehicle.oil_change_status(), OilChangeStatus::None);
        assert_eq!(vehicle.status_history.0.len(), 2);
        assert_eq!(vehicle.maintenance_history.0.len(), 1);
    }
}
