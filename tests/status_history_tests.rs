//! Tests de la máquina de estados del vehículo y su historial.

use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use fleet_management::models::vehicle::{
    apply_transition, oil_change_status, registration_expiring_soon, MaintenanceType,
    OilChangeStatus, StatusTransition, Vehicle, VehicleSource, VehicleStatus,
    OIL_CHANGE_INTERVAL_MILES,
};

fn vehicle(status: VehicleStatus, mileage: i64, next_due: Option<i64>) -> Vehicle {
    let now = Utc::now();
    Vehicle {
        id: Uuid::new_v4(),
        vehicle_descriptor: "2021 Honda Accord".to_string(),
        color: None,
        license_plate: Some("XYZ9876".to_string()),
        state: Some("NJ".to_string()),
        vin: None,
        source: VehicleSource::Avis,
        mva_number: Some("MVA-12345".to_string()),
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

fn transition(new_status: VehicleStatus, mileage: i64, oil: bool) -> StatusTransition {
    StatusTransition {
        new_status,
        mileage,
        user_id: Uuid::new_v4(),
        user_name: "Sam Rep".to_string(),
        is_oil_change: oil,
        note: Some("routine".to_string()),
    }
}

#[test]
fn every_transition_produces_exactly_one_status_entry() {
    let v = vehicle(VehicleStatus::Available, 1000, None);
    let statuses = [
        VehicleStatus::WithCustomer,
        VehicleStatus::Maintenance,
        VehicleStatus::Prospecting,
        VehicleStatus::Unavailable,
        VehicleStatus::Archived,
    ];

    for target in statuses {
        let outcome = apply_transition(&v, &transition(target, 1000, false), Utc::now()).unwrap();
        assert_eq!(outcome.status, target);
        assert_eq!(outcome.status_entry.previous_status, VehicleStatus::Available);
        assert_eq!(outcome.status_entry.new_status, target);
        assert!(outcome.maintenance_entry.is_none());
    }
}

#[test]
fn oil_change_produces_maintenance_entry_and_resets_interval() {
    let v = vehicle(VehicleStatus::Maintenance, 14600, Some(15000));
    let outcome =
        apply_transition(&v, &transition(VehicleStatus::Available, 14700, true), Utc::now())
            .unwrap();

    let entry = outcome.maintenance_entry.expect("maintenance entry");
    assert_eq!(entry.maintenance_type, MaintenanceType::OilChange);
    assert_eq!(entry.mileage, 14700);
    assert_eq!(
        outcome.next_oil_change_due_mileage,
        Some(14700 + OIL_CHANGE_INTERVAL_MILES)
    );
}

#[test]
fn full_oil_change_lifecycle() {
    // 10000 actuales, cambio a 15000: 5000 restantes, sin aviso
    let mut v = vehicle(VehicleStatus::Available, 10000, Some(15000));
    assert_eq!(v.miles_until_oil_change(), Some(5000));
    assert_eq!(v.oil_change_status(), OilChangeStatus::None);

    // a 14600 sin cambio: "due in 400 miles"
    let o = apply_transition(
        &v,
        &transition(VehicleStatus::WithCustomer, 14600, false),
        Utc::now(),
    )
    .unwrap();
    v.status = o.status;
    v.current_mileage = o.current_mileage;
    v.next_oil_change_due_mileage = o.next_oil_change_due_mileage;
    v.status_history.0.push(o.status_entry);

    assert_eq!(
        v.oil_change_status(),
        OilChangeStatus::Due {
            miles_remaining: 400
        }
    );
    assert_eq!(
        v.oil_change_status().label().as_deref(),
        Some("due in 400 miles")
    );

    // cambio de aceite a 14700: reset a 19700 y una entrada nueva
    let o = apply_transition(
        &v,
        &transition(VehicleStatus::Available, 14700, true),
        Utc::now(),
    )
    .unwrap();
    v.current_mileage = o.current_mileage;
    v.next_oil_change_due_mileage = o.next_oil_change_due_mileage;
    v.status_history.0.push(o.status_entry);
    v.maintenance_history.0.push(o.maintenance_entry.unwrap());

    assert_eq!(v.next_oil_change_due_mileage, Some(19700));
    assert_eq!(v.miles_until_oil_change(), Some(5000));
    assert_eq!(v.status_history.0.len(), 2);
    assert_eq!(v.maintenance_history.0.len(), 1);
}

#[test]
fn mileage_regression_is_rejected() {
    let v = vehicle(VehicleStatus::Available, 5000, None);
    let err = apply_transition(
        &v,
        &transition(VehicleStatus::Maintenance, 4999, false),
        Utc::now(),
    );
    assert!(err.is_err());
}

#[test]
fn archived_vehicle_only_reactivates_to_available() {
    let v = vehicle(VehicleStatus::Archived, 5000, None);

    for target in [
        VehicleStatus::WithCustomer,
        VehicleStatus::Maintenance,
        VehicleStatus::Prospecting,
        VehicleStatus::Unavailable,
    ] {
        assert!(
            apply_transition(&v, &transition(target, 5000, false), Utc::now()).is_err(),
            "archived -> {:?} should be rejected",
            target
        );
    }

    assert!(apply_transition(
        &v,
        &transition(VehicleStatus::Available, 5000, false),
        Utc::now()
    )
    .is_ok());
}

#[test]
fn history_entries_serialize_with_stable_field_names() {
    let v = vehicle(VehicleStatus::Available, 100, None);
    let outcome = apply_transition(
        &v,
        &transition(VehicleStatus::Maintenance, 150, true),
        Utc::now(),
    )
    .unwrap();

    let status_json = serde_json::to_value(&outcome.status_entry).unwrap();
    assert_eq!(status_json["previous_status"], "available");
    assert_eq!(status_json["new_status"], "maintenance");
    assert_eq!(status_json["mileage"], 150);
    assert_eq!(status_json["note"], "routine");

    let maintenance_json = serde_json::to_value(outcome.maintenance_entry.unwrap()).unwrap();
    assert_eq!(maintenance_json["maintenance_type"], "oil_change");
    assert_eq!(maintenance_json["mileage"], 150);
}

#[test]
fn registration_window_includes_expired() {
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    assert!(registration_expiring_soon(
        NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
        today
    ));
    assert!(registration_expiring_soon(
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        today
    ));
    assert!(!registration_expiring_soon(
        NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
        today
    ));
}

#[test]
fn oil_change_boundaries_match_thresholds() {
    assert_eq!(oil_change_status(Some(501)), OilChangeStatus::None);
    assert_eq!(
        oil_change_status(Some(500)),
        OilChangeStatus::Due {
            miles_remaining: 500
        }
    );
    assert_eq!(
        oil_change_status(Some(0)),
        OilChangeStatus::Overdue { miles_over: 0 }
    );
    assert_eq!(
        oil_change_status(Some(0)).label().as_deref(),
        Some("overdue by 0 miles")
    );
}
