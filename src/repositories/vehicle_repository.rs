//! Repositorio de Vehicle
//!
//! SQL de la tabla vehicles. El historial de estados y de mantenimiento
//! son columnas JSONB append-only; una transición se persiste en un único
//! UPDATE (status + kilometraje + appends + asignación).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::vehicle::{TransitionOutcome, Vehicle, VehicleSource, VehicleStatus};
use crate::utils::errors::{validation_error, AppError, AppResult};

/// Datos para crear un vehículo
#[derive(Debug)]
pub struct NewVehicle {
    pub vehicle_descriptor: String,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub state: Option<String>,
    pub vin: Option<String>,
    pub source: VehicleSource,
    pub mva_number: Option<String>,
    pub current_mileage: i64,
    pub next_oil_change_due_mileage: Option<i64>,
    pub registration_expiration: Option<NaiveDate>,
}

/// Campos actualizables de un vehículo (update parcial)
#[derive(Debug, Default)]
pub struct VehicleUpdate {
    pub vehicle_descriptor: Option<String>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub state: Option<String>,
    pub vin: Option<String>,
    pub mva_number: Option<String>,
    pub current_mileage: Option<i64>,
    pub next_oil_change_due_mileage: Option<i64>,
    pub registration_expiration: Option<NaiveDate>,
}

/// Filtros ya validados para el listado
#[derive(Debug, Default)]
pub struct VehicleQuery {
    pub status: Option<VehicleStatus>,
    pub source: Option<VehicleSource>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Datos de asignación a customer al entrar en with_customer
#[derive(Debug, Clone, Copy)]
pub struct VehicleAssignment {
    pub customer_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Uuid,
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: NewVehicle) -> AppResult<Vehicle> {
        let id = Uuid::new_v4();

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, vehicle_descriptor, color, license_plate, state, vin,
                source, mva_number, status, current_mileage,
                next_oil_change_due_mileage, registration_expiration,
                status_history, maintenance_history, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'available', $9, $10, $11,
                    '[]'::jsonb, '[]'::jsonb, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.vehicle_descriptor)
        .bind(data.color)
        .bind(data.license_plate)
        .bind(data.state)
        .bind(data.vin)
        .bind(data.source)
        .bind(data.mva_number)
        .bind(data.current_mileage)
        .bind(data.next_oil_change_due_mileage)
        .bind(data.registration_expiration)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// Igual que find_by_id pero dentro de una transacción, con lock de fila
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<Option<Vehicle>> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(vehicle)
    }

    pub async fn list(&self, query: &VehicleQuery) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::vehicle_status IS NULL OR status = $1)
              AND ($2::vehicle_source IS NULL OR source = $2)
              AND ($3::text IS NULL
                   OR vehicle_descriptor ILIKE '%' || $3 || '%'
                   OR license_plate ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(query.status)
        .bind(query.source)
        .bind(query.search.as_deref())
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn update(&self, id: Uuid, update: VehicleUpdate) -> AppResult<Vehicle> {
        // Obtener vehículo actual
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        // El kilometraje nunca retrocede
        if let Some(mileage) = update.current_mileage {
            if mileage < current.current_mileage {
                return Err(validation_error(
                    "current_mileage",
                    "mileage cannot be lower than the recorded mileage",
                ));
            }
        }

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET vehicle_descriptor = $2, color = $3, license_plate = $4,
                state = $5, vin = $6, mva_number = $7, current_mileage = $8,
                next_oil_change_due_mileage = $9, registration_expiration = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.vehicle_descriptor.unwrap_or(current.vehicle_descriptor))
        .bind(update.color.or(current.color))
        .bind(update.license_plate.or(current.license_plate))
        .bind(update.state.or(current.state))
        .bind(update.vin.or(current.vin))
        .bind(update.mva_number.or(current.mva_number))
        .bind(update.current_mileage.unwrap_or(current.current_mileage))
        .bind(
            update
                .next_oil_change_due_mileage
                .or(current.next_oil_change_due_mileage),
        )
        .bind(
            update
                .registration_expiration
                .or(current.registration_expiration),
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    /// Persistir una transición de estado en un único UPDATE atómico:
    /// status, kilometraje, intervalo de aceite, los dos appends JSONB
    /// y los campos de asignación.
    pub async fn apply_transition(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        vehicle_id: Uuid,
        outcome: &TransitionOutcome,
        assigned_to: Option<Uuid>,
        assignment: Option<VehicleAssignment>,
    ) -> AppResult<Vehicle> {
        let status_entry = serde_json::to_value(&outcome.status_entry)
            .map_err(|e| AppError::Internal(format!("Error serializing history entry: {}", e)))?;

        let maintenance_entry = outcome
            .maintenance_entry
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| {
                AppError::Internal(format!("Error serializing maintenance entry: {}", e))
            })?;

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET status = $2,
                current_mileage = $3,
                next_oil_change_due_mileage = $4,
                status_history = status_history || $5::jsonb,
                maintenance_history = CASE
                    WHEN $6::jsonb IS NULL THEN maintenance_history
                    ELSE maintenance_history || $6::jsonb
                END,
                assigned_to = $7,
                customer_id = $8,
                assigned_at = $9,
                assigned_by = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(outcome.status)
        .bind(outcome.current_mileage)
        .bind(outcome.next_oil_change_due_mileage)
        .bind(status_entry)
        .bind(maintenance_entry)
        .bind(assigned_to)
        .bind(assignment.map(|a| a.customer_id))
        .bind(assignment.map(|a| a.assigned_at))
        .bind(assignment.map(|a| a.assigned_by))
        .fetch_one(&mut **tx)
        .await?;

        Ok(vehicle)
    }

    /// Hard delete. Dentro de una transacción para que el controller pueda
    /// limpiar la asignación del customer en la misma operación.
    pub async fn delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        Ok(())
    }
}
