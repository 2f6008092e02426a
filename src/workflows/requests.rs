use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::Role;
use crate::db;
use crate::error::AppError;
use crate::models::{Decision, Feedback, LeaveReport, Notification};
use crate::validation::{
    FeedbackReply, FeedbackSubmission, LeaveApplication, NotificationInput, invalid, parse_date,
};

/// Files a leave request in the Pending state. Past dates and repeated
/// requests for the same day are accepted.
#[instrument(skip(pool, input))]
pub async fn apply_leave(
    pool: &Pool<Sqlite>,
    owner_id: i64,
    input: &LeaveApplication,
) -> Result<i64, AppError> {
    input.validate()?;
    let date = parse_date("date", &input.date)?;
    db::get_user(pool, owner_id).await?;

    let id = db::insert_leave(pool, owner_id, date, input.message.trim()).await?;
    info!(leave_id = id, %date, "Leave applied");
    Ok(id)
}

/// Approves or rejects a pending leave. Decided leaves stay decided: a second
/// response is an `InvalidTransition`.
#[instrument(skip(pool))]
pub async fn respond_to_leave(
    pool: &Pool<Sqlite>,
    leave_id: i64,
    decision: Decision,
) -> Result<LeaveReport, AppError> {
    let outcome = decision.outcome();
    let mut tx = pool.begin().await?;

    if db::decide_pending_leave(&mut *tx, leave_id, outcome).await? == 0 {
        let current = db::get_leave(&mut *tx, leave_id).await?;
        warn!(status = current.status.label(), "Leave already decided");
        return Err(AppError::InvalidTransition(format!(
            "Leave {} is already {}",
            leave_id,
            current.status.label()
        )));
    }

    let leave = db::get_leave(&mut *tx, leave_id).await?;
    tx.commit().await?;

    info!(status = leave.status.label(), "Leave decided");
    Ok(leave)
}

#[instrument(skip(pool, input))]
pub async fn submit_feedback(
    pool: &Pool<Sqlite>,
    owner_id: i64,
    input: &FeedbackSubmission,
) -> Result<i64, AppError> {
    input.validate()?;
    db::get_user(pool, owner_id).await?;

    let id = db::insert_feedback(pool, owner_id, input.feedback.trim()).await?;
    info!(feedback_id = id, "Feedback submitted");
    Ok(id)
}

/// Sets or replaces the reply text.
#[instrument(skip(pool, input))]
pub async fn reply_to_feedback(
    pool: &Pool<Sqlite>,
    feedback_id: i64,
    input: &FeedbackReply,
) -> Result<Feedback, AppError> {
    input.validate()?;

    let mut tx = pool.begin().await?;
    if db::set_feedback_reply(&mut *tx, feedback_id, input.reply.trim()).await? == 0 {
        return Err(AppError::NotFound(format!(
            "Feedback with id {} not found",
            feedback_id
        )));
    }
    let feedback = db::get_feedback(&mut *tx, feedback_id).await?;
    tx.commit().await?;

    Ok(feedback)
}

#[instrument(skip(pool))]
pub async fn leave_for_role(pool: &Pool<Sqlite>, role: Role) -> Result<Vec<LeaveReport>, AppError> {
    db::list_leave_by_role(pool, role).await
}

#[instrument(skip(pool))]
pub async fn leave_history(pool: &Pool<Sqlite>, owner_id: i64) -> Result<Vec<LeaveReport>, AppError> {
    db::list_leave_for_owner(pool, owner_id).await
}

#[instrument(skip(pool))]
pub async fn feedback_for_role(pool: &Pool<Sqlite>, role: Role) -> Result<Vec<Feedback>, AppError> {
    db::list_feedback_by_role(pool, role).await
}

#[instrument(skip(pool))]
pub async fn feedback_history(pool: &Pool<Sqlite>, owner_id: i64) -> Result<Vec<Feedback>, AppError> {
    db::list_feedback_for_owner(pool, owner_id).await
}

#[instrument(skip(pool, input), fields(recipient_id = input.recipient_id))]
pub async fn send_notification(
    pool: &Pool<Sqlite>,
    input: &NotificationInput,
) -> Result<i64, AppError> {
    input.validate()?;

    let recipient = db::get_user(pool, input.recipient_id).await?;
    if recipient.role == Role::Admin {
        return Err(invalid(
            "recipient_id",
            "Notifications can only be sent to staff or students",
        ));
    }

    let id = db::insert_notification(pool, recipient.id, input.message.trim()).await?;
    info!(notification_id = id, "Notification stored");
    Ok(id)
}

#[instrument(skip(pool))]
pub async fn notifications_for(
    pool: &Pool<Sqlite>,
    recipient_id: i64,
) -> Result<Vec<Notification>, AppError> {
    db::list_notifications(pool, recipient_id).await
}
