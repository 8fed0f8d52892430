//! Tests de customers contra Postgres: creación con su entrada de
//! historial, idempotencia del share y borrado completo.

use sqlx::PgPool;
use uuid::Uuid;

use fleet_management::controllers::customer_controller::CustomerController;
use fleet_management::dto::customer_dto::{
    AddNoteRequest, CreateCustomerRequest, ShareCustomerRequest,
};
use fleet_management::models::customer::HistoryEntryType;
use fleet_management::models::user::{ActingUser, UserRole};
use fleet_management::repositories::customer_repository::CustomerRepository;
use fleet_management::repositories::user_repository::UserRepository;

async fn seed_user(pool: &PgPool, name: &str, email: &str, role: UserRole) -> ActingUser {
    let user = UserRepository::new(pool.clone())
        .create(
            name.to_string(),
            email.to_string(),
            // hash precomputado, estos tests no hacen login
            "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            role,
        )
        .await
        .expect("seed user");

    ActingUser::from(&user)
}

async fn seed_customer(controller: &CustomerController, acting: &ActingUser, name: &str) -> Uuid {
    let response = controller
        .create(
            acting,
            CreateCustomerRequest {
                name: name.to_string(),
                email: None,
                phone: None,
            },
        )
        .await
        .expect("create customer");

    Uuid::parse_str(&response.data.expect("customer payload").id).expect("customer id")
}

#[sqlx::test(migrations = "./migrations")]
async fn create_customer_sets_primary_owner_and_history(pool: PgPool) {
    let acting = seed_user(&pool, "Ana Rep", "ana@fleet.test", UserRole::Rep).await;
    let controller = CustomerController::new(pool.clone());

    let response = controller
        .create(
            &acting,
            CreateCustomerRequest {
                name: "Acme Corp".to_string(),
                email: Some("ops@acme.test".to_string()),
                phone: None,
            },
        )
        .await
        .expect("create customer");

    let customer = response.data.expect("customer payload");
    assert_eq!(customer.primary_owner_id, acting.id.to_string());
    assert!(customer.additional_owner_ids.is_empty());

    let id = Uuid::parse_str(&customer.id).expect("customer id");
    let entries = CustomerRepository::new(pool.clone())
        .history(id)
        .await
        .expect("history");

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_type, HistoryEntryType::Update);
    assert_eq!(entries[0].description, "Customer created");
    assert_eq!(entries[0].user_id, acting.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn share_is_idempotent(pool: PgPool) {
    let owner = seed_user(&pool, "Ana Rep", "ana@fleet.test", UserRole::Rep).await;
    let colleague = seed_user(&pool, "Ben Rep", "ben@fleet.test", UserRole::Rep).await;
    let controller = CustomerController::new(pool.clone());

    let id = seed_customer(&controller, &owner, "Acme Corp").await;

    for _ in 0..2 {
        controller
            .share(
                &owner,
                id,
                ShareCustomerRequest {
                    user_id: colleague.id,
                },
            )
            .await
            .expect("share");
    }

    let customer = CustomerRepository::new(pool.clone())
        .find_by_id(id)
        .await
        .expect("find")
        .expect("customer");
    assert_eq!(customer.additional_owner_ids, vec![colleague.id]);

    // Solo el primer share genera historial
    let shares = CustomerRepository::new(pool.clone())
        .history(id)
        .await
        .expect("history")
        .into_iter()
        .filter(|e| e.entry_type == HistoryEntryType::Share)
        .count();
    assert_eq!(shares, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_removes_customer_and_history(pool: PgPool) {
    let owner = seed_user(&pool, "Ana Rep", "ana@fleet.test", UserRole::Rep).await;
    let controller = CustomerController::new(pool.clone());

    let id = seed_customer(&controller, &owner, "Acme Corp").await;
    controller
        .add_note(
            &owner,
            id,
            AddNoteRequest {
                note: "Prefiere entregas por la mañana".to_string(),
            },
        )
        .await
        .expect("add note");

    controller.delete(&owner, id).await.expect("delete");

    let repository = CustomerRepository::new(pool.clone());
    assert!(repository.find_by_id(id).await.expect("find").is_none());
    assert!(repository.history(id).await.expect("history").is_empty());
}
