use serde::Serialize;

use super::{Permission, Role};
use crate::error::AppError;

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub gender: String,
    pub address: String,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(user: DbUser) -> Result<Self, Self::Error> {
        let role = Role::from_str(&user.role.unwrap_or_default())
            .map_err(|e| AppError::Internal(format!("Stored user has {}", e)))?;

        Ok(Self {
            id: user.id.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            role,
            gender: user.gender.unwrap_or_default(),
            address: user.address.unwrap_or_default(),
            course_id: user.course_id,
            session_id: user.session_id,
        })
    }
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(format!(
                "{} accounts cannot perform this action",
                self.role
            )))
        }
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = %self.role.as_str(),
                required = %role.as_str(),
                "Role mismatch"
            );
            Err(AppError::Authorization(format!(
                "Only {} accounts can perform this action",
                role
            )))
        }
    }
}
