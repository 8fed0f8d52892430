//! Controller de Customer
//!
//! Operaciones sobre customers. Cada mutación visible va emparejada con
//! una entrada del audit log, en la misma transacción.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::customer_dto::{
    AddNoteRequest, AssignVehicleRequest, CreateCustomerRequest, CustomerResponse,
    HistoryEntryResponse, ShareCustomerRequest, UpdateCustomerRequest,
};
use crate::dto::ApiResponse;
use crate::models::customer::{AssignedVehicle, HistoryEntryType};
use crate::models::user::ActingUser;
use crate::repositories::customer_repository::CustomerRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{forbidden_error, not_found_error, validation_error, AppError};
use crate::utils::validation::validate_phone;

pub struct CustomerController {
    repository: CustomerRepository,
    users: UserRepository,
    vehicles: VehicleRepository,
    pool: PgPool,
}

impl CustomerController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CustomerRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn create(
        &self,
        acting: &ActingUser,
        request: CreateCustomerRequest,
    ) -> Result<ApiResponse<CustomerResponse>, AppError> {
        request.validate()?;

        if request.name.trim().is_empty() {
            return Err(validation_error("name", "name is required"));
        }

        if let Some(ref phone) = request.phone {
            validate_phone(phone)
                .map_err(|_| validation_error("phone", "invalid phone number"))?;
        }

        let mut tx = self.pool.begin().await?;

        let customer = self
            .repository
            .create(
                &mut tx,
                request.name.trim().to_string(),
                request.email,
                request.phone,
                acting.id,
            )
            .await?;

        self.repository
            .append_history(
                &mut tx,
                customer.id,
                HistoryEntryType::Update,
                "Customer created".to_string(),
                acting,
            )
            .await?;

        tx.commit().await?;

        Ok(ApiResponse::success_with_message(
            customer.into(),
            "Cliente creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(
        &self,
        acting: &ActingUser,
        id: Uuid,
    ) -> Result<CustomerResponse, AppError> {
        let customer = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        if !customer.can_view(acting) {
            return Err(forbidden_error(
                "view customer",
                "customer is not shared with you",
            ));
        }

        Ok(customer.into())
    }

    pub async fn list(&self, acting: &ActingUser) -> Result<Vec<CustomerResponse>, AppError> {
        let customers = self.repository.list_visible(acting).await?;
        Ok(customers.into_iter().map(|c| c.into()).collect())
    }

    pub async fn update(
        &self,
        acting: &ActingUser,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<ApiResponse<CustomerResponse>, AppError> {
        request.validate()?;

        if let Some(ref name) = request.name {
            if name.trim().is_empty() {
                return Err(validation_error("name", "name cannot be empty"));
            }
        }

        if let Some(ref phone) = request.phone {
            validate_phone(phone)
                .map_err(|_| validation_error("phone", "invalid phone number"))?;
        }

        let mut tx = self.pool.begin().await?;

        let current = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        if !current.can_view(acting) {
            return Err(forbidden_error(
                "update customer",
                "customer is not shared with you",
            ));
        }

        let mut changed: Vec<&str> = Vec::new();
        if request.name.is_some() {
            changed.push("name");
        }
        if request.email.is_some() {
            changed.push("email");
        }
        if request.phone.is_some() {
            changed.push("phone");
        }

        let customer = self
            .repository
            .update(
                &mut tx,
                id,
                request
                    .name
                    .map(|n| n.trim().to_string())
                    .unwrap_or(current.name),
                request.email.or(current.email),
                request.phone.or(current.phone),
            )
            .await?;

        if !changed.is_empty() {
            self.repository
                .append_history(
                    &mut tx,
                    id,
                    HistoryEntryType::Update,
                    format!("Updated {}", changed.join(", ")),
                    acting,
                )
                .await?;
        }

        tx.commit().await?;

        Ok(ApiResponse::success_with_message(
            customer.into(),
            "Cliente actualizado exitosamente".to_string(),
        ))
    }

    /// Compartir con otro usuario. Idempotente: repetir el share con el
    /// mismo usuario no duplica el id ni genera historial nuevo.
    pub async fn share(
        &self,
        acting: &ActingUser,
        id: Uuid,
        request: ShareCustomerRequest,
    ) -> Result<ApiResponse<CustomerResponse>, AppError> {
        let mut tx = self.pool.begin().await?;

        let customer = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        if !customer.is_primary_owner(acting) {
            return Err(forbidden_error(
                "share customer",
                "only the primary owner may share a customer",
            ));
        }

        let target = self
            .users
            .find_by_id(request.user_id)
            .await?
            .ok_or_else(|| validation_error("user_id", "target user does not exist"))?;

        let added = self
            .repository
            .add_additional_owner(&mut tx, id, target.id)
            .await?;

        if added {
            self.repository
                .append_history(
                    &mut tx,
                    id,
                    HistoryEntryType::Share,
                    format!("Customer shared with {}", target.display_name),
                    acting,
                )
                .await?;
            log::info!("🤝 Cliente {} compartido con {}", id, target.display_name);
        }

        tx.commit().await?;

        let customer = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        Ok(ApiResponse::success(customer.into()))
    }

    pub async fn add_note(
        &self,
        acting: &ActingUser,
        id: Uuid,
        request: AddNoteRequest,
    ) -> Result<ApiResponse<()>, AppError> {
        request.validate()?;

        let customer = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        if !customer.can_view(acting) {
            return Err(forbidden_error(
                "add note",
                "customer is not shared with you",
            ));
        }

        let mut tx = self.pool.begin().await?;
        self.repository
            .append_history(&mut tx, id, HistoryEntryType::Note, request.note, acting)
            .await?;
        tx.commit().await?;

        Ok(ApiResponse::message_only("Nota añadida".to_string()))
    }

    /// Asignar un vehículo al customer. Conflict si ya está en la lista.
    pub async fn assign_vehicle(
        &self,
        acting: &ActingUser,
        id: Uuid,
        request: AssignVehicleRequest,
    ) -> Result<ApiResponse<CustomerResponse>, AppError> {
        let mut tx = self.pool.begin().await?;

        let customer = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        if !customer.can_view(acting) {
            return Err(forbidden_error(
                "assign vehicle",
                "customer is not shared with you",
            ));
        }

        if customer.has_vehicle(request.vehicle_id) {
            return Err(AppError::Conflict(
                "Vehicle is already assigned to this customer".to_string(),
            ));
        }

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &request.vehicle_id.to_string()))?;

        let descriptor = request
            .descriptor
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| vehicle.vehicle_descriptor.clone());

        let entry = AssignedVehicle {
            vehicle_id: vehicle.id,
            descriptor: descriptor.clone(),
            assigned_at: Utc::now(),
            assigned_by: acting.id,
        };

        self.repository
            .add_assigned_vehicle(&mut tx, id, &entry)
            .await?;

        self.repository
            .append_history(
                &mut tx,
                id,
                HistoryEntryType::Vehicle,
                format!("Vehicle '{}' assigned", descriptor),
                acting,
            )
            .await?;

        tx.commit().await?;

        let customer = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        Ok(ApiResponse::success_with_message(
            customer.into(),
            "Vehículo asignado al cliente".to_string(),
        ))
    }

    /// Borrado: solo el owner principal y solo sin vehículos asignados
    pub async fn delete(&self, acting: &ActingUser, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let customer = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        customer.check_delete(acting)?;

        self.repository.delete(&mut tx, id).await?;

        tx.commit().await?;

        log::info!("🗑️ Cliente {} eliminado por {}", id, acting.email);

        Ok(())
    }

    pub async fn history(
        &self,
        acting: &ActingUser,
        id: Uuid,
    ) -> Result<Vec<HistoryEntryResponse>, AppError> {
        let customer = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        if !customer.can_view(acting) {
            return Err(forbidden_error(
                "view customer history",
                "customer is not shared with you",
            ));
        }

        let entries = self.repository.history(id).await?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }
}
