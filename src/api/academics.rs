use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use super::Created;
use crate::auth::{Permission, Role, User};
use crate::db;
use crate::error::AppError;
use crate::models::{AcademicSession, Course, Subject};
use crate::validation::{CourseInput, SessionInput, SubjectInput};
use crate::workflows::academics;

#[get("/courses")]
pub async fn list_courses(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(db::list_courses(db.inner()).await?))
}

#[post("/courses", data = "<course>")]
pub async fn create_course(
    course: Json<CourseInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    let id = academics::create_course(db, &course).await?;
    Ok(Json(Created { id }))
}

#[put("/courses/<id>", data = "<course>")]
pub async fn rename_course(
    id: i64,
    course: Json<CourseInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    academics::rename_course(db, id, &course).await?;
    Ok(Status::Ok)
}

#[delete("/courses/<id>")]
pub async fn delete_course(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    academics::remove_course(db, id).await?;
    Ok(Status::NoContent)
}

#[get("/sessions")]
pub async fn list_sessions(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AcademicSession>>, AppError> {
    Ok(Json(db::list_sessions(db.inner()).await?))
}

#[post("/sessions", data = "<session>")]
pub async fn create_session(
    session: Json<SessionInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    let (start_date, end_date) = session.parse()?;
    let id = academics::create_session(db, start_date, end_date).await?;
    Ok(Json(Created { id }))
}

#[put("/sessions/<id>", data = "<session>")]
pub async fn edit_session(
    id: i64,
    session: Json<SessionInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    let (start_date, end_date) = session.parse()?;
    academics::edit_session(db, id, start_date, end_date).await?;
    Ok(Status::Ok)
}

#[delete("/sessions/<id>")]
pub async fn delete_session(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    academics::remove_session(db, id).await?;
    Ok(Status::NoContent)
}

/// Admins see every subject, staff the ones they teach, students their course's.
#[get("/subjects")]
pub async fn list_subjects(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Subject>>, AppError> {
    let subjects = if user.has_permission(Permission::ViewAllSubjects) {
        db::list_subjects(db.inner()).await?
    } else if user.role == Role::Staff {
        db::find_subjects_by_staff(db.inner(), user.id).await?
    } else {
        match user.course_id {
            Some(course_id) => db::find_subjects_by_course(db.inner(), course_id).await?,
            None => Vec::new(),
        }
    };

    Ok(Json(subjects))
}

#[post("/subjects", data = "<subject>")]
pub async fn create_subject(
    subject: Json<SubjectInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    let id = academics::create_subject(db, &subject).await?;
    Ok(Json(Created { id }))
}

#[put("/subjects/<id>", data = "<subject>")]
pub async fn edit_subject(
    id: i64,
    subject: Json<SubjectInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    academics::edit_subject(db, id, &subject).await?;
    Ok(Status::Ok)
}

#[delete("/subjects/<id>")]
pub async fn delete_subject(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageAcademics)?;

    academics::remove_subject(db, id).await?;
    Ok(Status::NoContent)
}
