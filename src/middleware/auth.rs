//! Middleware de autenticación
//!
//! Valida el bearer token y resuelve el usuario que ejecuta la request.
//! El JWT solo identifica: el rol y el estado de la cuenta se leen de la
//! fila almacenada, que es la fuente de verdad. Un usuario desactivado
//! queda fuera aunque su token siga siendo válido.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::models::user::ActingUser;
use crate::repositories::user_repository::UserRepository;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{verify_token, JwtConfig};

/// Extraer el token del header Authorization
fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".to_string()))
}

/// Middleware de autenticación: inserta ActingUser como extension
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?.to_string();

    let jwt_config = JwtConfig::from(&state.config);
    let claims = verify_token(&token, &jwt_config)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Jwt("Invalid subject claim".to_string()))?;

    let user = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

    if !user.is_active() {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    request.extensions_mut().insert(ActingUser::from(&user));

    Ok(next.run(request).await)
}
