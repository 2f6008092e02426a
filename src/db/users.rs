use sqlx::{Executor, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, Role, User};
use crate::error::AppError;

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, role, gender, address, course_id, session_id";

pub struct UserRecord<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Role,
    pub gender: &'a str,
    pub address: &'a str,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
}

#[instrument(skip(executor))]
pub async fn get_user<'e, E>(executor: E, id: i64) -> Result<User, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    match row {
        Some(user) => User::try_from(user),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(executor))]
pub async fn find_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Finding user by email");
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE email = ? COLLATE NOCASE",
        USER_COLUMNS
    ))
    .bind(email.trim())
    .fetch_optional(executor)
    .await?;

    row.map(User::try_from).transpose()
}

#[instrument(skip_all, fields(email = %user.email, role = %user.role))]
pub async fn insert_user<'e, E>(executor: E, user: &UserRecord<'_>) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Inserting user");
    let res = sqlx::query(
        "INSERT INTO users
         (email, password, first_name, last_name, role, gender, address, course_id, session_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.email.trim())
    .bind(user.password_hash)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.role.as_str())
    .bind(user.gender)
    .bind(user.address)
    .bind(user.course_id)
    .bind(user.session_id)
    .execute(executor)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn list_users_by_role<'e, E>(executor: E, role: Role) -> Result<Vec<User>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!(role = %role, "Getting users by role");
    let rows = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE role = ? ORDER BY first_name, last_name",
        USER_COLUMNS
    ))
    .bind(role.as_str())
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(User::try_from).collect()
}

/// Students enrolled in a course for one academic session, ordered by name.
#[instrument(skip(executor))]
pub async fn find_students_by_course_session<'e, E>(
    executor: E,
    course_id: i64,
    session_id: i64,
) -> Result<Vec<User>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting enrolled students");
    let rows = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users
         WHERE role = 'student' AND course_id = ? AND session_id = ?
         ORDER BY first_name, last_name",
        USER_COLUMNS
    ))
    .bind(course_id)
    .bind(session_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(User::try_from).collect()
}

#[instrument(skip(executor))]
pub async fn count_users_by_role<'e, E>(executor: E, role: Role) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(role.as_str())
        .fetch_one(executor)
        .await?;

    Ok(count)
}

#[instrument(skip(executor))]
pub async fn count_students_in_course<'e, E>(executor: E, course_id: i64) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'student' AND course_id = ?")
            .bind(course_id)
            .fetch_one(executor)
            .await?;

    Ok(count)
}

/// Editable account fields. Role and password are changed elsewhere.
pub struct UserDetails<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub gender: &'a str,
    pub address: &'a str,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
}

#[instrument(skip(executor, details), fields(email = %details.email))]
pub async fn update_user_details<'e, E>(
    executor: E,
    id: i64,
    details: &UserDetails<'_>,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Updating user details");
    let res = sqlx::query(
        "UPDATE users
         SET email = ?, first_name = ?, last_name = ?, gender = ?, address = ?,
             course_id = ?, session_id = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(details.email.trim())
    .bind(details.first_name)
    .bind(details.last_name)
    .bind(details.gender)
    .bind(details.address)
    .bind(details.course_id)
    .bind(details.session_id)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor, password_hash))]
pub async fn update_user_password<'e, E>(
    executor: E,
    id: i64,
    password_hash: &str,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Updating user password");
    let res = sqlx::query(
        "UPDATE users SET password = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(password_hash)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn delete_user<'e, E>(executor: E, id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Deleting user");
    let res = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(res.rows_affected())
}
