use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};
use tracing::{info, instrument};

use crate::auth::Role;
use crate::error::AppError;
use crate::models::{DbFeedback, DbLeaveReport, Feedback, LeaveReport, LeaveStatus};

const LEAVE_SELECT: &str = "SELECT l.id, l.owner_id,
        u.first_name || ' ' || u.last_name AS owner_name, u.role AS owner_role,
        l.date, l.message, l.status, l.created_at
     FROM leave_reports l
     JOIN users u ON u.id = l.owner_id";

const FEEDBACK_SELECT: &str = "SELECT f.id, f.owner_id,
        u.first_name || ' ' || u.last_name AS owner_name, u.role AS owner_role,
        f.feedback, f.reply, f.created_at
     FROM feedback f
     JOIN users u ON u.id = f.owner_id";

#[instrument(skip(executor, message))]
pub async fn insert_leave<'e, E>(
    executor: E,
    owner_id: i64,
    date: NaiveDate,
    message: &str,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Creating leave report");
    let res = sqlx::query(
        "INSERT INTO leave_reports (owner_id, date, message, status) VALUES (?, ?, ?, ?)",
    )
    .bind(owner_id)
    .bind(date)
    .bind(message)
    .bind(LeaveStatus::Pending.code())
    .execute(executor)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn get_leave<'e, E>(executor: E, id: i64) -> Result<LeaveReport, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Fetching leave report");
    let row = sqlx::query_as::<_, DbLeaveReport>(&format!("{} WHERE l.id = ?", LEAVE_SELECT))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    match row {
        Some(leave) => Ok(LeaveReport::from(leave)),
        _ => Err(AppError::NotFound(format!(
            "Leave report with id {} not found",
            id
        ))),
    }
}

/// Moves a pending leave to `outcome` in one statement. Zero rows affected
/// means the leave is missing or already decided.
#[instrument(skip(executor))]
pub async fn decide_pending_leave<'e, E>(
    executor: E,
    id: i64,
    outcome: LeaveStatus,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!(outcome = outcome.label(), "Deciding leave report");
    let res = sqlx::query(
        "UPDATE leave_reports
         SET status = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ? AND status = ?",
    )
    .bind(outcome.code())
    .bind(id)
    .bind(LeaveStatus::Pending.code())
    .execute(executor)
    .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn list_leave_by_role<'e, E>(executor: E, role: Role) -> Result<Vec<LeaveReport>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!(role = %role, "Getting leave reports by role");
    let rows = sqlx::query_as::<_, DbLeaveReport>(&format!(
        "{} WHERE u.role = ? ORDER BY l.created_at DESC, l.id DESC",
        LEAVE_SELECT
    ))
    .bind(role.as_str())
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(LeaveReport::from).collect())
}

#[instrument(skip(executor))]
pub async fn list_leave_for_owner<'e, E>(
    executor: E,
    owner_id: i64,
) -> Result<Vec<LeaveReport>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting leave history");
    let rows = sqlx::query_as::<_, DbLeaveReport>(&format!(
        "{} WHERE l.owner_id = ? ORDER BY l.date DESC, l.id DESC",
        LEAVE_SELECT
    ))
    .bind(owner_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(LeaveReport::from).collect())
}

#[instrument(skip(executor, feedback))]
pub async fn insert_feedback<'e, E>(executor: E, owner_id: i64, feedback: &str) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Creating feedback");
    let res = sqlx::query("INSERT INTO feedback (owner_id, feedback) VALUES (?, ?)")
        .bind(owner_id)
        .bind(feedback)
        .execute(executor)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn get_feedback<'e, E>(executor: E, id: i64) -> Result<Feedback, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Fetching feedback");
    let row = sqlx::query_as::<_, DbFeedback>(&format!("{} WHERE f.id = ?", FEEDBACK_SELECT))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    match row {
        Some(feedback) => Ok(Feedback::from(feedback)),
        _ => Err(AppError::NotFound(format!("Feedback with id {} not found", id))),
    }
}

#[instrument(skip(executor, reply))]
pub async fn set_feedback_reply<'e, E>(executor: E, id: i64, reply: &str) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Replying to feedback");
    let res = sqlx::query(
        "UPDATE feedback SET reply = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(reply)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn list_feedback_by_role<'e, E>(executor: E, role: Role) -> Result<Vec<Feedback>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!(role = %role, "Getting feedback by role");
    let rows = sqlx::query_as::<_, DbFeedback>(&format!(
        "{} WHERE u.role = ? ORDER BY f.created_at DESC, f.id DESC",
        FEEDBACK_SELECT
    ))
    .bind(role.as_str())
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Feedback::from).collect())
}

#[instrument(skip(executor))]
pub async fn list_feedback_for_owner<'e, E>(executor: E, owner_id: i64) -> Result<Vec<Feedback>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting feedback history");
    let rows = sqlx::query_as::<_, DbFeedback>(&format!(
        "{} WHERE f.owner_id = ? ORDER BY f.created_at DESC, f.id DESC",
        FEEDBACK_SELECT
    ))
    .bind(owner_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Feedback::from).collect())
}
