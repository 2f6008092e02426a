use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use super::Created;
use crate::auth::{Permission, Role, User};
use crate::db;
use crate::error::AppError;
use crate::validation::{NewUser, ProfileUpdate, UserUpdate, invalid};
use crate::workflows::academics;

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailAvailability {
    pub email: String,
    pub available: bool,
}

#[get("/me")]
pub async fn me(user: User) -> Json<User> {
    Json(user)
}

#[put("/me", data = "<profile>")]
pub async fn update_profile(
    profile: Json<ProfileUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    academics::update_profile(db, user.id, &profile).await?;
    Ok(Status::Ok)
}

#[post("/users", data = "<registration>")]
pub async fn create_user(
    registration: Json<NewUser>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::ManageUsers)?;

    let id = academics::create_user(db, &registration).await?;
    Ok(Json(Created { id }))
}

#[put("/users/<id>", data = "<update>")]
pub async fn edit_user(
    id: i64,
    update: Json<UserUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageUsers)?;

    academics::edit_user(db, id, &update).await?;
    Ok(Status::Ok)
}

#[delete("/users/<id>")]
pub async fn delete_user(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageUsers)?;

    academics::remove_user(db, id).await?;
    Ok(Status::NoContent)
}

#[get("/users?<role>")]
pub async fn list_users(
    role: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<User>>, AppError> {
    user.require_permission(Permission::ManageUsers)?;

    let role = Role::from_str(role).map_err(|_| invalid("role", "Unknown user type"))?;
    Ok(Json(db::list_users_by_role(db.inner(), role).await?))
}

#[get("/users/email-available?<email>")]
pub async fn email_available(
    email: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<EmailAvailability>, AppError> {
    user.require_permission(Permission::ManageUsers)?;

    let in_use = academics::email_in_use(db, email).await?;
    Ok(Json(EmailAvailability {
        email: email.to_string(),
        available: !in_use,
    }))
}

/// Students enrolled in a course for a session, as used for roll calls.
#[get("/students?<course_id>&<session_id>")]
pub async fn class_list(
    course_id: i64,
    session_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<User>>, AppError> {
    user.require_permission(Permission::TakeAttendance)?;

    Ok(Json(
        db::find_students_by_course_session(db.inner(), course_id, session_id).await?,
    ))
}
