use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;

use super::{Created, student_for_actor, subject_for_actor};
use crate::auth::{Permission, User};
use crate::db;
use crate::error::AppError;
use crate::models::{Attendance, AttendanceDay, AttendanceEntry, AttendanceSummary};
use crate::validation::parse_date;
use crate::workflows::attendance::{self, StatusChange};

#[derive(Debug, Serialize, Deserialize)]
pub struct TakeAttendanceRequest {
    pub subject_id: i64,
    pub session_id: i64,
    pub date: String,
    #[serde(default)]
    pub present_student_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub changes: Vec<StatusChange>,
}

#[post("/attendance", data = "<request>")]
pub async fn take_attendance(
    request: Json<TakeAttendanceRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::TakeAttendance)?;
    subject_for_actor(db, &user, request.subject_id).await?;

    let date = parse_date("date", &request.date)?;
    let present: HashSet<i64> = request.present_student_ids.iter().copied().collect();

    let id =
        attendance::take_attendance(db, request.subject_id, request.session_id, date, &present)
            .await?;
    Ok(Json(Created { id }))
}

#[put("/attendance/<id>", data = "<request>")]
pub async fn update_attendance(
    id: i64,
    request: Json<UpdateAttendanceRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::TakeAttendance)?;
    let taken = db::get_attendance(db.inner(), id).await?;
    subject_for_actor(db, &user, taken.subject_id).await?;

    attendance::update_attendance(db, id, &request.changes).await?;
    Ok(Status::Ok)
}

#[get("/attendance/<id>")]
pub async fn attendance_entries(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AttendanceEntry>>, AppError> {
    user.require_permission(Permission::TakeAttendance)?;
    let taken = db::get_attendance(db.inner(), id).await?;
    subject_for_actor(db, &user, taken.subject_id).await?;

    Ok(Json(attendance::fetch_attendance_for_date(db, id).await?))
}

#[get("/attendance?<subject_id>&<session_id>")]
pub async fn attendance_dates(
    subject_id: i64,
    session_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Attendance>>, AppError> {
    user.require_permission(Permission::TakeAttendance)?;
    subject_for_actor(db, &user, subject_id).await?;

    Ok(Json(
        attendance::list_attendance_dates(db, subject_id, session_id).await?,
    ))
}

#[get("/attendance/mine?<subject_id>")]
pub async fn my_attendance(
    subject_id: Option<i64>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AttendanceSummary>, AppError> {
    user.require_permission(Permission::ViewOwnAttendance)?;

    Ok(Json(
        attendance::compute_attendance_percentage(db, user.id, subject_id).await?,
    ))
}

#[get("/attendance/mine/range?<subject_id>&<start_date>&<end_date>")]
pub async fn my_attendance_between(
    subject_id: i64,
    start_date: &str,
    end_date: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AttendanceDay>>, AppError> {
    user.require_permission(Permission::ViewOwnAttendance)?;
    let start_date = parse_date("start_date", start_date)?;
    let end_date = parse_date("end_date", end_date)?;

    Ok(Json(
        attendance::student_attendance_between(db, user.id, subject_id, start_date, end_date)
            .await?,
    ))
}

#[get("/students/<student_id>/attendance?<subject_id>")]
pub async fn student_attendance(
    student_id: i64,
    subject_id: Option<i64>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AttendanceSummary>, AppError> {
    user.require_permission(Permission::TakeAttendance)?;
    match subject_id {
        Some(subject_id) => {
            subject_for_actor(db, &user, subject_id).await?;
        }
        None => student_for_actor(db, &user, student_id).await?,
    }

    Ok(Json(
        attendance::compute_attendance_percentage(db, student_id, subject_id).await?,
    ))
}
