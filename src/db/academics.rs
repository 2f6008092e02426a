use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{AcademicSession, Course, Subject};

const SUBJECT_SELECT: &str = "SELECT s.id, s.name, s.course_id, c.name AS course_name,
        s.staff_id, u.first_name || ' ' || u.last_name AS staff_name
     FROM subjects s
     JOIN courses c ON c.id = s.course_id
     JOIN users u ON u.id = s.staff_id";

#[instrument(skip(executor))]
pub async fn insert_course<'e, E>(executor: E, name: &str) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Creating course");
    let res = sqlx::query("INSERT INTO courses (name) VALUES (?)")
        .bind(name)
        .execute(executor)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn get_course<'e, E>(executor: E, id: i64) -> Result<Course, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Fetching course");
    sqlx::query_as::<_, Course>("SELECT id, name FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course with id {} not found", id)))
}

#[instrument(skip(executor))]
pub async fn list_courses<'e, E>(executor: E) -> Result<Vec<Course>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting all courses");
    let rows = sqlx::query_as::<_, Course>("SELECT id, name FROM courses ORDER BY name")
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

#[instrument(skip(executor))]
pub async fn update_course_name<'e, E>(executor: E, id: i64, name: &str) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Renaming course");
    let res = sqlx::query(
        "UPDATE courses SET name = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(name)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn delete_course<'e, E>(executor: E, id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Deleting course");
    let res = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn count_courses<'e, E>(executor: E) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(executor)
        .await?;

    Ok(count)
}

#[instrument(skip(executor))]
pub async fn insert_session<'e, E>(
    executor: E,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Creating academic session");
    let res = sqlx::query("INSERT INTO sessions (start_date, end_date) VALUES (?, ?)")
        .bind(start_date)
        .bind(end_date)
        .execute(executor)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn update_session<'e, E>(
    executor: E,
    id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Updating academic session");
    let res = sqlx::query("UPDATE sessions SET start_date = ?, end_date = ? WHERE id = ?")
        .bind(start_date)
        .bind(end_date)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn get_session<'e, E>(executor: E, id: i64) -> Result<AcademicSession, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Fetching academic session");
    sqlx::query_as::<_, AcademicSession>(
        "SELECT id, start_date, end_date FROM sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Session with id {} not found", id)))
}

#[instrument(skip(executor))]
pub async fn list_sessions<'e, E>(executor: E) -> Result<Vec<AcademicSession>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting all academic sessions");
    let rows = sqlx::query_as::<_, AcademicSession>(
        "SELECT id, start_date, end_date FROM sessions ORDER BY start_date DESC",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

#[instrument(skip(executor))]
pub async fn delete_session<'e, E>(executor: E, id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Deleting academic session");
    let res = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn insert_subject<'e, E>(
    executor: E,
    name: &str,
    course_id: i64,
    staff_id: i64,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Creating subject");
    let res = sqlx::query("INSERT INTO subjects (name, course_id, staff_id) VALUES (?, ?, ?)")
        .bind(name)
        .bind(course_id)
        .bind(staff_id)
        .execute(executor)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn get_subject<'e, E>(executor: E, id: i64) -> Result<Subject, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Fetching subject");
    sqlx::query_as::<_, Subject>(&format!("{} WHERE s.id = ?", SUBJECT_SELECT))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Subject with id {} not found", id)))
}

#[instrument(skip(executor))]
pub async fn list_subjects<'e, E>(executor: E) -> Result<Vec<Subject>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting all subjects");
    let rows = sqlx::query_as::<_, Subject>(&format!("{} ORDER BY s.name", SUBJECT_SELECT))
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

#[instrument(skip(executor))]
pub async fn find_subjects_by_staff<'e, E>(executor: E, staff_id: i64) -> Result<Vec<Subject>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting subjects taught by staff member");
    let rows = sqlx::query_as::<_, Subject>(&format!(
        "{} WHERE s.staff_id = ? ORDER BY s.name",
        SUBJECT_SELECT
    ))
    .bind(staff_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

#[instrument(skip(executor))]
pub async fn find_subjects_by_course<'e, E>(executor: E, course_id: i64) -> Result<Vec<Subject>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting subjects for course");
    let rows = sqlx::query_as::<_, Subject>(&format!(
        "{} WHERE s.course_id = ? ORDER BY s.name",
        SUBJECT_SELECT
    ))
    .bind(course_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

#[instrument(skip(executor))]
pub async fn update_subject<'e, E>(
    executor: E,
    id: i64,
    name: &str,
    course_id: i64,
    staff_id: i64,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Updating subject");
    let res = sqlx::query(
        "UPDATE subjects
         SET name = ?, course_id = ?, staff_id = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(name)
    .bind(course_id)
    .bind(staff_id)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn delete_subject<'e, E>(executor: E, id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Deleting subject");
    let res = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn count_subjects<'e, E>(executor: E) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects")
        .fetch_one(executor)
        .await?;

    Ok(count)
}
