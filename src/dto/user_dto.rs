//! DTOs de User

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::User;

/// Request para invitar a un usuario nuevo
#[derive(Debug, Deserialize, Validate)]
pub struct InviteUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    /// "admin" | "rep"; por defecto rep
    pub role: Option<String>,
}

/// Request para cambiar el rol de un usuario
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    /// "admin" | "rep"
    pub role: String,
}

/// Request para activar/desactivar un usuario
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    /// "active" | "inactive"
    pub status: String,
}

/// Response de usuario para la API (nunca expone el hash)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub invited_at: String,
    pub last_login_at: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            display_name: user.display_name,
            email: user.email,
            role: user.role.as_str().to_string(),
            status: user.user_status.as_str().to_string(),
            invited_at: user.invited_at.to_rfc3339(),
            last_login_at: user.last_login_at.map(|d| d.to_rfc3339()),
        }
    }
}
