use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use super::subject_for_actor;
use crate::auth::{Permission, User};
use crate::error::AppError;
use crate::models::{ResultLine, StudentResult};
use crate::workflows::results::{self, ScoreInput};

#[put("/results", data = "<score>")]
pub async fn set_result(
    score: Json<ScoreInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::RecordResults)?;
    subject_for_actor(db, &user, score.subject_id).await?;

    results::set_result(db, &score).await?;
    Ok(Status::Ok)
}

#[get("/results?<student_id>&<subject_id>&<session_id>")]
pub async fn get_result(
    student_id: i64,
    subject_id: i64,
    session_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<StudentResult>, AppError> {
    user.require_permission(Permission::RecordResults)?;
    subject_for_actor(db, &user, subject_id).await?;

    Ok(Json(
        results::get_result(db, student_id, subject_id, session_id).await?,
    ))
}

#[get("/results/mine")]
pub async fn my_results(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<ResultLine>>, AppError> {
    user.require_permission(Permission::ViewOwnResults)?;

    Ok(Json(results::results_for_student(db, user.id).await?))
}

#[get("/students/<student_id>/results")]
pub async fn student_results(
    student_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<ResultLine>>, AppError> {
    user.require_permission(Permission::RecordResults)?;

    Ok(Json(results::results_for_student(db, student_id).await?))
}
