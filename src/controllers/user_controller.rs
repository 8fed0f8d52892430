//! Controller de User
//!
//! Gestión de usuarios (solo admins, salvo el perfil propio).

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::{InviteUserRequest, SetRoleRequest, SetStatusRequest, UserResponse};
use crate::dto::ApiResponse;
use crate::models::user::{ActingUser, UserRole, UserStatus};
use crate::repositories::user_repository::UserRepository;
use crate::utils::errors::{not_found_error, validation_error, AppError};

pub struct UserController {
    repository: UserRepository,
    bcrypt_cost: u32,
}

impl UserController {
    pub fn new(pool: PgPool, bcrypt_cost: u32) -> Self {
        Self {
            repository: UserRepository::new(pool),
            bcrypt_cost,
        }
    }

    pub async fn invite(
        &self,
        acting: &ActingUser,
        request: InviteUserRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        acting.require_admin("invite user")?;
        request.validate()?;

        if self.repository.email_exists(&request.email).await? {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let role = match request.role.as_deref() {
            Some(r) => UserRole::from_str(r)
                .ok_or_else(|| validation_error("role", "role must be 'admin' or 'rep'"))?,
            None => UserRole::Rep,
        };

        let password_hash = bcrypt::hash(&request.password, self.bcrypt_cost)
            .map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))?;

        let user = self
            .repository
            .create(
                request.display_name.trim().to_string(),
                request.email.to_lowercase(),
                password_hash,
                role,
            )
            .await?;

        log::info!("✉️ Usuario {} invitado por {}", user.email, acting.email);

        Ok(ApiResponse::success_with_message(
            user.into(),
            "Usuario invitado exitosamente".to_string(),
        ))
    }

    pub async fn list(&self, acting: &ActingUser) -> Result<Vec<UserResponse>, AppError> {
        acting.require_admin("list users")?;

        let users = self.repository.list().await?;
        Ok(users.into_iter().map(|u| u.into()).collect())
    }

    pub async fn set_role(
        &self,
        acting: &ActingUser,
        id: Uuid,
        request: SetRoleRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        acting.require_admin("change user role")?;

        let role = UserRole::from_str(&request.role)
            .ok_or_else(|| validation_error("role", "role must be 'admin' or 'rep'"))?;

        let user = self.repository.set_role(id, role).await?;

        Ok(ApiResponse::success(user.into()))
    }

    pub async fn set_status(
        &self,
        acting: &ActingUser,
        id: Uuid,
        request: SetStatusRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        acting.require_admin("change user status")?;

        let status = UserStatus::from_str(&request.status)
            .ok_or_else(|| validation_error("status", "status must be 'active' or 'inactive'"))?;

        let user = self.repository.set_status(id, status).await?;

        Ok(ApiResponse::success(user.into()))
    }

    /// Perfil del usuario autenticado, disponible para cualquier rol
    pub async fn me(&self, acting: &ActingUser) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .find_by_id(acting.id)
            .await?
            .ok_or_else(|| not_found_error("User", &acting.id.to_string()))?;

        Ok(user.into())
    }
}
