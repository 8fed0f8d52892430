//! Modelo de User
//!
//! Usuarios internos de la flota. El rol y el estado son toggles
//! independientes; la fila almacenada es la fuente de verdad del rol
//! (los claims del JWT solo identifican al usuario).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::{forbidden_error, AppError};

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Rep,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Rep => "rep",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "rep" => Some(UserRole::Rep),
            _ => None,
        }
    }
}

/// Estado de la cuenta (independiente del rol)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            _ => None,
        }
    }
}

/// User principal - mapea exactamente a la tabla users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub user_status: UserStatus,
    pub invited_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.user_status == UserStatus::Active
    }
}

/// Identidad que ejecuta una operación. Se pasa explícitamente a cada
/// operación (sin estado de sesión ambiental) y se usa para autorización
/// y atribución en el historial.
#[derive(Debug, Clone)]
pub struct ActingUser {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: UserRole,
}

impl ActingUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Autorización a nivel de operación (no en la capa de presentación)
    pub fn require_admin(&self, operation: &str) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(forbidden_error(operation, "admin role required"))
        }
    }
}

impl From<&User> for ActingUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(UserRole::from_str("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_str("rep"), Some(UserRole::Rep));
        assert_eq!(UserRole::from_str("livreur"), None);
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn test_acting_user_is_admin() {
        let acting = ActingUser {
            id: Uuid::new_v4(),
            display_name: "Admin".to_string(),
            email: "admin@fleet.test".to_string(),
            role: UserRole::Admin,
        };
        assert!(acting.is_admin());
    }
}
