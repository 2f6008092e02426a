pub mod academics;
pub mod attendance;
pub mod dashboard;
pub mod library;
pub mod requests;
pub mod results;

use sqlx::{Executor, Sqlite};

use crate::auth::{Role, User};
use crate::db::get_user;
use crate::error::AppError;

/// True when a store error came from a UNIQUE constraint.
pub(crate) fn is_unique_violation(err: &AppError) -> bool {
    match err {
        AppError::StoreFailure(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Loads a user and checks it holds `role`; anything else reads as missing.
pub(crate) async fn require_user_with_role<'e, E>(
    executor: E,
    id: i64,
    role: Role,
) -> Result<User, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let label = match role {
        Role::Admin => "Admin",
        Role::Staff => "Staff member",
        Role::Student => "Student",
    };

    match get_user(executor, id).await {
        Ok(user) if user.role == role => Ok(user),
        Ok(_) | Err(AppError::NotFound(_)) => {
            Err(AppError::NotFound(format!("{} with id {} not found", label, id)))
        }
        Err(err) => Err(err),
    }
}
