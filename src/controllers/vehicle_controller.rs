//! Controller de Vehicle
//!
//! Capa de operaciones sobre vehículos: validación, autorización y el
//! emparejamiento de cada mutación con sus entradas de historial. Las
//! operaciones multi-escritura corren dentro de una transacción.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::vehicle_dto::{
    ChangeStatusRequest, CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters,
    VehicleListResponse, VehicleResponse,
};
use crate::dto::ApiResponse;
use crate::models::customer::{AssignedVehicle, HistoryEntryType};
use crate::models::user::ActingUser;
use crate::models::vehicle::{
    apply_transition, StatusTransition, VehicleSource, VehicleStatus,
};
use crate::repositories::customer_repository::CustomerRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::{
    NewVehicle, VehicleAssignment, VehicleQuery, VehicleRepository, VehicleUpdate,
};
use crate::utils::errors::{not_found_error, validation_error, AppError};
use crate::utils::validation::{validate_license_plate, validate_vin};
use validator::Validate;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

pub struct VehicleController {
    repository: VehicleRepository,
    customers: CustomerRepository,
    users: UserRepository,
    pool: PgPool,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn create(
        &self,
        _acting: &ActingUser,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        if request.vehicle_descriptor.trim().is_empty() {
            return Err(validation_error(
                "vehicle_descriptor",
                "vehicle descriptor is required",
            ));
        }

        let source = VehicleSource::from_str(&request.source)
            .ok_or_else(|| validation_error("source", "source must be 'jay' or 'avis'"))?;

        // El número MVA solo existe para vehículos de Avis
        if request.mva_number.is_some() && source != VehicleSource::Avis {
            return Err(validation_error(
                "mva_number",
                "mva_number is only valid for avis vehicles",
            ));
        }

        if let Some(ref vin) = request.vin {
            validate_vin(vin).map_err(|_| validation_error("vin", "invalid VIN format"))?;
        }

        if let Some(ref plate) = request.license_plate {
            validate_license_plate(plate)
                .map_err(|_| validation_error("license_plate", "invalid license plate"))?;
        }

        let vehicle = self
            .repository
            .create(NewVehicle {
                vehicle_descriptor: request.vehicle_descriptor.trim().to_string(),
                color: request.color,
                license_plate: request.license_plate,
                state: request.state,
                vin: request.vin,
                source,
                mva_number: request.mva_number,
                current_mileage: request.current_mileage.unwrap_or(0),
                next_oil_change_due_mileage: request.next_oil_change_due_mileage,
                registration_expiration: request.registration_expiration,
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(
        &self,
        _acting: &ActingUser,
        id: Uuid,
    ) -> Result<VehicleResponse, AppError> {
        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        Ok(vehicle.into())
    }

    pub async fn list(
        &self,
        _acting: &ActingUser,
        filters: VehicleFilters,
    ) -> Result<Vec<VehicleListResponse>, AppError> {
        let status = match filters.status.as_deref() {
            Some(s) => Some(
                VehicleStatus::from_str(s)
                    .ok_or_else(|| validation_error("status", "unknown status filter"))?,
            ),
            None => None,
        };

        let source = match filters.source.as_deref() {
            Some(s) => Some(
                VehicleSource::from_str(s)
                    .ok_or_else(|| validation_error("source", "unknown source filter"))?,
            ),
            None => None,
        };

        let query = VehicleQuery {
            status,
            source,
            search: filters.search.filter(|s| !s.trim().is_empty()),
            limit: filters
                .limit
                .unwrap_or(DEFAULT_LIST_LIMIT)
                .clamp(1, MAX_LIST_LIMIT),
            offset: filters.offset.unwrap_or(0).max(0),
        };

        let vehicles = self.repository.list(&query).await?;

        Ok(vehicles.into_iter().map(|v| v.into()).collect())
    }

    pub async fn update(
        &self,
        _acting: &ActingUser,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        if let Some(ref descriptor) = request.vehicle_descriptor {
            if descriptor.trim().is_empty() {
                return Err(validation_error(
                    "vehicle_descriptor",
                    "vehicle descriptor cannot be empty",
                ));
            }
        }

        if request.mva_number.is_some() && current.source != VehicleSource::Avis {
            return Err(validation_error(
                "mva_number",
                "mva_number is only valid for avis vehicles",
            ));
        }

        if let Some(ref vin) = request.vin {
            validate_vin(vin).map_err(|_| validation_error("vin", "invalid VIN format"))?;
        }

        if let Some(ref plate) = request.license_plate {
            validate_license_plate(plate)
                .map_err(|_| validation_error("license_plate", "invalid license plate"))?;
        }

        let vehicle = self
            .repository
            .update(
                id,
                VehicleUpdate {
                    vehicle_descriptor: request.vehicle_descriptor.map(|d| d.trim().to_string()),
                    color: request.color,
                    license_plate: request.license_plate,
                    state: request.state,
                    vin: request.vin,
                    mva_number: request.mva_number,
                    current_mileage: request.current_mileage,
                    next_oil_change_due_mileage: request.next_oil_change_due_mileage,
                    registration_expiration: request.registration_expiration,
                },
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo actualizado exitosamente".to_string(),
        ))
    }

    /// Transición de estado. Side effects, todos en una transacción:
    /// - exactamente una entrada de status_history
    /// - una entrada de maintenance_history si es cambio de aceite
    /// - asignación a customer al entrar en with_customer (con su entrada
    ///   de historial del customer), y liberación al salir
    pub async fn change_status(
        &self,
        acting: &ActingUser,
        id: Uuid,
        request: ChangeStatusRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let new_status = request
            .new_status
            .as_deref()
            .ok_or_else(|| validation_error("new_status", "new_status is required"))?;
        let new_status = VehicleStatus::from_str(new_status)
            .ok_or_else(|| validation_error("new_status", "unknown vehicle status"))?;

        let mileage = request
            .mileage
            .ok_or_else(|| validation_error("mileage", "mileage is required"))?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let vehicle = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        let transition = StatusTransition {
            new_status,
            mileage,
            user_id: acting.id,
            user_name: acting.display_name.clone(),
            is_oil_change: request.is_oil_change,
            note: request.note.clone(),
        };

        let outcome = apply_transition(&vehicle, &transition, now)?;

        // Al entrar en prospecting el vehículo queda asignado a un rep
        let assigned_to = if new_status == VehicleStatus::Prospecting {
            let rep = request.assigned_to.unwrap_or(acting.id);
            if rep != acting.id && !self.users.exists(rep).await? {
                return Err(validation_error(
                    "assigned_to",
                    "assigned user does not exist",
                ));
            }
            Some(rep)
        } else {
            None
        };

        // Al salir de with_customer se libera la asignación anterior
        if let Some(previous_customer) = vehicle.customer_id {
            let keeps_customer =
                new_status == VehicleStatus::WithCustomer && request.customer_id == Some(previous_customer);
            if !keeps_customer {
                self.customers
                    .remove_assigned_vehicle(&mut tx, previous_customer, vehicle.id)
                    .await?;
                self.customers
                    .append_history(
                        &mut tx,
                        previous_customer,
                        HistoryEntryType::Vehicle,
                        format!("Vehicle '{}' returned", vehicle.vehicle_descriptor),
                        acting,
                    )
                    .await?;
            }
        }

        let assignment = if new_status == VehicleStatus::WithCustomer {
            let customer_id = request.customer_id.ok_or_else(|| {
                validation_error("customer_id", "customer_id is required for with_customer")
            })?;

            let customer = self
                .customers
                .find_by_id_for_update(&mut tx, customer_id)
                .await?
                .ok_or_else(|| not_found_error("Customer", &customer_id.to_string()))?;

            if !customer.has_vehicle(vehicle.id) {
                let entry = AssignedVehicle {
                    vehicle_id: vehicle.id,
                    descriptor: vehicle.vehicle_descriptor.clone(),
                    assigned_at: now,
                    assigned_by: acting.id,
                };
                self.customers
                    .add_assigned_vehicle(&mut tx, customer_id, &entry)
                    .await?;
                self.customers
                    .append_history(
                        &mut tx,
                        customer_id,
                        HistoryEntryType::Vehicle,
                        format!("Vehicle '{}' assigned", vehicle.vehicle_descriptor),
                        acting,
                    )
                    .await?;
            }

            Some(VehicleAssignment {
                customer_id,
                assigned_at: now,
                assigned_by: acting.id,
            })
        } else {
            None
        };

        let updated = self
            .repository
            .apply_transition(&mut tx, id, &outcome, assigned_to, assignment)
            .await?;

        tx.commit().await?;

        log::info!(
            "🔄 Vehículo {} -> {} ({} mi)",
            id,
            new_status.as_str(),
            mileage
        );

        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Estado del vehículo actualizado".to_string(),
        ))
    }

    /// Hard delete, solo admins. El borrado lógico preferido es archivar
    /// vía change_status(archived).
    pub async fn delete(&self, acting: &ActingUser, id: Uuid) -> Result<(), AppError> {
        acting.require_admin("delete vehicle")?;

        let mut tx = self.pool.begin().await?;

        let vehicle = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        if let Some(customer_id) = vehicle.customer_id {
            self.customers
                .remove_assigned_vehicle(&mut tx, customer_id, vehicle.id)
                .await?;
            self.customers
                .append_history(
                    &mut tx,
                    customer_id,
                    HistoryEntryType::Vehicle,
                    format!("Vehicle '{}' deleted", vehicle.vehicle_descriptor),
                    acting,
                )
                .await?;
        }

        self.repository.delete(&mut tx, id).await?;

        tx.commit().await?;

        log::info!("🗑️ Vehículo {} eliminado por {}", id, acting.email);

        Ok(())
    }
}
