//! Controller de autenticación
//!
//! Login con email/password. El token emitido solo identifica al usuario;
//! el rol se lee de la base de datos en cada request.

use sqlx::PgPool;
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse};
use crate::repositories::user_repository::UserRepository;
use crate::utils::errors::AppError;
use crate::utils::jwt::{generate_token, JwtConfig};

pub struct AuthController {
    repository: UserRepository,
    jwt_config: JwtConfig,
}

impl AuthController {
    pub fn new(pool: PgPool, jwt_config: JwtConfig) -> Self {
        Self {
            repository: UserRepository::new(pool),
            jwt_config,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let user = self
            .repository
            .find_by_email(&request.email.to_lowercase())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        if !user.is_active() {
            log::warn!("⚠️ Login rechazado para cuenta inactiva: {}", user.email);
            return Err(AppError::Unauthorized("Account is inactive".to_string()));
        }

        let valid = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verifying password: {}", e)))?;

        if !valid {
            log::warn!("⚠️ Password incorrecto para {}", user.email);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        self.repository.record_login(user.id).await?;

        log::info!("✅ Login de {}", user.email);

        let token = generate_token(user.id, &user.email, &self.jwt_config)?;
        let expires_at = chrono::Utc::now()
            + chrono::Duration::seconds(self.jwt_config.expiration as i64);

        Ok(LoginResponse {
            success: true,
            token,
            expires_at,
            user: user.into(),
        })
    }
}
