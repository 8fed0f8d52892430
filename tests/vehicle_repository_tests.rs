//! Tests de vehículos contra Postgres: emparejamiento de asignación a
//! customer con su historial y validación del rep asignado.

use sqlx::PgPool;
use uuid::Uuid;

use axum::http::StatusCode;
use fleet_management::controllers::customer_controller::CustomerController;
use fleet_management::controllers::vehicle_controller::VehicleController;
use fleet_management::dto::customer_dto::CreateCustomerRequest;
use fleet_management::dto::vehicle_dto::ChangeStatusRequest;
use fleet_management::models::customer::HistoryEntryType;
use fleet_management::models::user::{ActingUser, UserRole};
use fleet_management::models::vehicle::{Vehicle, VehicleSource, VehicleStatus};
use fleet_management::repositories::customer_repository::CustomerRepository;
use fleet_management::repositories::user_repository::UserRepository;
use fleet_management::repositories::vehicle_repository::{NewVehicle, VehicleRepository};

async fn seed_user(pool: &PgPool, name: &str, email: &str, role: UserRole) -> ActingUser {
    let user = UserRepository::new(pool.clone())
        .create(
            name.to_string(),
            email.to_string(),
            "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            role,
        )
        .await
        .expect("seed user");

    ActingUser::from(&user)
}

async fn seed_vehicle(pool: &PgPool, descriptor: &str) -> Vehicle {
    VehicleRepository::new(pool.clone())
        .create(NewVehicle {
            vehicle_descriptor: descriptor.to_string(),
            color: None,
            license_plate: None,
            state: None,
            vin: None,
            source: VehicleSource::Jay,
            mva_number: None,
            current_mileage: 10000,
            next_oil_change_due_mileage: Some(15000),
            registration_expiration: None,
        })
        .await
        .expect("seed vehicle")
}

#[sqlx::test(migrations = "./migrations")]
async fn with_customer_pairs_assignment_and_history(pool: PgPool) {
    let acting = seed_user(&pool, "Ana Rep", "ana@fleet.test", UserRole::Rep).await;
    let vehicle = seed_vehicle(&pool, "2021 Honda Accord").await;

    let customers = CustomerController::new(pool.clone());
    let customer = customers
        .create(
            &acting,
            CreateCustomerRequest {
                name: "Acme Corp".to_string(),
                email: None,
                phone: None,
            },
        )
        .await
        .expect("create customer");
    let customer_id =
        Uuid::parse_str(&customer.data.expect("customer payload").id).expect("customer id");

    let vehicles = VehicleController::new(pool.clone());
    vehicles
        .change_status(
            &acting,
            vehicle.id,
            ChangeStatusRequest {
                new_status: Some("with_customer".to_string()),
                mileage: Some(10250),
                customer_id: Some(customer_id),
                ..Default::default()
            },
        )
        .await
        .expect("change status");

    let updated = VehicleRepository::new(pool.clone())
        .find_by_id(vehicle.id)
        .await
        .expect("find vehicle")
        .expect("vehicle");
    assert_eq!(updated.status, VehicleStatus::WithCustomer);
    assert_eq!(updated.customer_id, Some(customer_id));
    assert_eq!(updated.current_mileage, 10250);
    assert_eq!(updated.status_history.0.len(), 1);

    let repository = CustomerRepository::new(pool.clone());
    let stored = repository
        .find_by_id(customer_id)
        .await
        .expect("find customer")
        .expect("customer");
    assert!(stored.has_vehicle(vehicle.id));

    let assignments = repository
        .history(customer_id)
        .await
        .expect("history")
        .into_iter()
        .filter(|e| e.entry_type == HistoryEntryType::Vehicle)
        .count();
    assert_eq!(assignments, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn prospecting_rejects_unknown_assigned_user(pool: PgPool) {
    let acting = seed_user(&pool, "Ana Rep", "ana@fleet.test", UserRole::Rep).await;
    let vehicle = seed_vehicle(&pool, "2021 Honda Accord").await;

    let controller = VehicleController::new(pool.clone());
    let error = controller
        .change_status(
            &acting,
            vehicle.id,
            ChangeStatusRequest {
                new_status: Some("prospecting".to_string()),
                mileage: Some(10100),
                assigned_to: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .expect_err("assigned_to does not exist");

    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

    // La transición no se aplicó
    let unchanged = VehicleRepository::new(pool.clone())
        .find_by_id(vehicle.id)
        .await
        .expect("find vehicle")
        .expect("vehicle");
    assert_eq!(unchanged.status, VehicleStatus::Available);
    assert!(unchanged.status_history.0.is_empty());
}
