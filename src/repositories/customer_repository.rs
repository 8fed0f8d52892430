//! Repositorio de Customer
//!
//! SQL de las tablas customers y customer_history. El historial vive en
//! su propia tabla y es append-only: nunca se edita ni se borra una fila
//! salvo al eliminar el customer completo.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::customer::{AssignedVehicle, Customer, CustomerHistoryEntry, HistoryEntryType};
use crate::models::user::ActingUser;
use crate::utils::errors::{AppError, AppResult};

pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: String,
        email: Option<String>,
        phone: Option<String>,
        primary_owner_id: Uuid,
    ) -> AppResult<Customer> {
        let id = Uuid::new_v4();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                id, name, email, phone, primary_owner_id,
                additional_owner_ids, assigned_vehicles, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, '{}', '[]'::jsonb, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(primary_owner_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(customer)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<Option<Customer>> {
        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(customer)
    }

    /// Customers visibles para el usuario: admins ven todos, el resto solo
    /// los que poseen o les han compartido
    pub async fn list_visible(&self, acting: &ActingUser) -> AppResult<Vec<Customer>> {
        let customers = if acting.is_admin() {
            sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query_as::<_, Customer>(
                r#"
                SELECT * FROM customers
                WHERE primary_owner_id = $1 OR $1 = ANY(additional_owner_ids)
                ORDER BY created_at DESC
                "#,
            )
            .bind(acting.id)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(customers)
    }

    /// Update de campos básicos; el controller aporta los valores ya
    /// fusionados y acompaña el cambio con su entrada de historial en la
    /// misma transacción.
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> AppResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, email = $3, phone = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .fetch_one(&mut **tx)
        .await?;

        Ok(customer)
    }

    /// Añadir un owner adicional. Idempotente: si el usuario ya está en la
    /// lista la fila no cambia y devuelve false.
    pub async fn add_additional_owner(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET additional_owner_ids = array_append(additional_owner_ids, $2),
                updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(additional_owner_ids))
            "#,
        )
        .bind(customer_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn add_assigned_vehicle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer_id: Uuid,
        entry: &AssignedVehicle,
    ) -> AppResult<()> {
        let entry = serde_json::to_value(entry)
            .map_err(|e| AppError::Internal(format!("Error serializing assignment: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE customers
            SET assigned_vehicles = assigned_vehicles || $2::jsonb,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(customer_id)
        .bind(entry)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn remove_assigned_vehicle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer_id: Uuid,
        vehicle_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE customers
            SET assigned_vehicles = COALESCE(
                    (SELECT jsonb_agg(elem)
                     FROM jsonb_array_elements(assigned_vehicles) elem
                     WHERE elem->>'vehicle_id' <> $2),
                    '[]'::jsonb
                ),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(customer_id)
        .bind(vehicle_id.to_string())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Append al audit log del customer. Las filas nunca se editan.
    pub async fn append_history(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer_id: Uuid,
        entry_type: HistoryEntryType,
        description: String,
        acting: &ActingUser,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customer_history (
                id, customer_id, entry_type, description, user_id, user_name, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(entry_type)
        .bind(description)
        .bind(acting.id)
        .bind(&acting.display_name)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Historial completo en orden de inserción
    pub async fn history(&self, customer_id: Uuid) -> AppResult<Vec<CustomerHistoryEntry>> {
        let entries = sqlx::query_as::<_, CustomerHistoryEntry>(
            "SELECT * FROM customer_history WHERE customer_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Borrar el customer y su historial en la misma transacción
    pub async fn delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM customer_history WHERE customer_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer not found".to_string()));
        }

        Ok(())
    }
}
