use sqlx::{Executor, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{ResultLine, StudentResult};

/// Inserts the score pair or overwrites the existing row for the same
/// (student, subject, session).
#[instrument(skip(executor))]
pub async fn upsert_result<'e, E>(
    executor: E,
    student_id: i64,
    subject_id: i64,
    session_id: i64,
    test: f64,
    exam: f64,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Saving student result");
    sqlx::query(
        "INSERT INTO student_results (student_id, subject_id, session_id, test, exam)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (student_id, subject_id, session_id)
         DO UPDATE SET test = excluded.test, exam = excluded.exam,
                       updated_at = CURRENT_TIMESTAMP",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(session_id)
    .bind(test)
    .bind(exam)
    .execute(executor)
    .await?;

    Ok(())
}

#[instrument(skip(executor))]
pub async fn find_result<'e, E>(
    executor: E,
    student_id: i64,
    subject_id: i64,
    session_id: i64,
) -> Result<Option<StudentResult>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Fetching student result");
    let row = sqlx::query_as::<_, StudentResult>(
        "SELECT id, student_id, subject_id, session_id, test, exam FROM student_results
         WHERE student_id = ? AND subject_id = ? AND session_id = ?",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(session_id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

#[instrument(skip(executor))]
pub async fn list_results_for_student<'e, E>(
    executor: E,
    student_id: i64,
) -> Result<Vec<ResultLine>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting results for student");
    let rows = sqlx::query_as::<_, ResultLine>(
        "SELECT r.subject_id, s.name AS subject_name, r.session_id, r.test, r.exam,
            r.test + r.exam AS total
         FROM student_results r
         JOIN subjects s ON s.id = r.subject_id
         WHERE r.student_id = ?
         ORDER BY s.name, r.session_id",
    )
    .bind(student_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
