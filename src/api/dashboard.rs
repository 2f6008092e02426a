use rocket::State;
use rocket::serde::Serialize;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use crate::auth::{Role, User};
use crate::error::AppError;
use crate::workflows::dashboard::{self as views, AdminDashboard, StaffDashboard, StudentDashboard};

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Admin(AdminDashboard),
    Staff(StaffDashboard),
    Student(StudentDashboard),
}

#[get("/dashboard")]
pub async fn dashboard(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<Dashboard>, AppError> {
    let view = match user.role {
        Role::Admin => Dashboard::Admin(views::admin_dashboard(db).await?),
        Role::Staff => Dashboard::Staff(views::staff_dashboard(db, user.id).await?),
        Role::Student => Dashboard::Student(views::student_dashboard(db, user.id).await?),
    };

    Ok(Json(view))
}
