use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::require_user_with_role;
use crate::auth::Role;
use crate::db;
use crate::error::AppError;
use crate::models::{ResultLine, StudentResult};
use crate::validation::check_score;

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct ScoreInput {
    pub student_id: i64,
    pub subject_id: i64,
    pub session_id: i64,
    pub test: f64,
    pub exam: f64,
}

/// Creates or overwrites the single result row for (student, subject, session).
#[instrument(skip(pool))]
pub async fn set_result(pool: &Pool<Sqlite>, input: &ScoreInput) -> Result<(), AppError> {
    check_score("test", input.test)?;
    check_score("exam", input.exam)?;

    let mut tx = pool.begin().await?;
    require_user_with_role(&mut *tx, input.student_id, Role::Student).await?;
    db::get_subject(&mut *tx, input.subject_id).await?;
    db::get_session(&mut *tx, input.session_id).await?;

    db::upsert_result(
        &mut *tx,
        input.student_id,
        input.subject_id,
        input.session_id,
        input.test,
        input.exam,
    )
    .await?;
    tx.commit().await?;

    info!("Result saved");
    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_result(
    pool: &Pool<Sqlite>,
    student_id: i64,
    subject_id: i64,
    session_id: i64,
) -> Result<StudentResult, AppError> {
    db::find_result(pool, student_id, subject_id, session_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No result for student {} in subject {} for session {}",
                student_id, subject_id, session_id
            ))
        })
}

#[instrument(skip(pool))]
pub async fn results_for_student(
    pool: &Pool<Sqlite>,
    student_id: i64,
) -> Result<Vec<ResultLine>, AppError> {
    require_user_with_role(pool, student_id, Role::Student).await?;
    db::list_results_for_student(pool, student_id).await
}
