use rocket::State;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use super::Created;
use crate::auth::{Permission, Role, User};
use crate::error::AppError;
use crate::models::{Decision, Feedback, LeaveReport, Notification};
use crate::validation::{
    FeedbackReply, FeedbackSubmission, LeaveApplication, NotificationInput, invalid,
};
use crate::workflows::requests;

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveResponse {
    pub decision: Decision,
}

/// Review pages list staff or student requests, never admin ones.
fn reviewable_role(role: &str) -> Result<Role, AppError> {
    match Role::from_str(role) {
        Ok(Role::Admin) | Err(_) => Err(invalid("role", "Role must be staff or student")),
        Ok(role) => Ok(role),
    }
}

#[post("/leave", data = "<application>")]
pub async fn apply_leave(
    application: Json<LeaveApplication>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::ApplyLeave)?;

    let id = requests::apply_leave(db, user.id, &application).await?;
    Ok(Json(Created { id }))
}

#[get("/leave")]
pub async fn my_leave(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<LeaveReport>>, AppError> {
    user.require_permission(Permission::ApplyLeave)?;

    Ok(Json(requests::leave_history(db, user.id).await?))
}

#[get("/leave/review?<role>")]
pub async fn review_leave(
    role: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<LeaveReport>>, AppError> {
    user.require_permission(Permission::ReviewRequests)?;

    let role = reviewable_role(role)?;
    Ok(Json(requests::leave_for_role(db, role).await?))
}

#[put("/leave/<id>", data = "<response>")]
pub async fn respond_to_leave(
    id: i64,
    response: Json<LeaveResponse>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LeaveReport>, AppError> {
    user.require_permission(Permission::ReviewRequests)?;

    Ok(Json(requests::respond_to_leave(db, id, response.decision).await?))
}

#[post("/feedback", data = "<submission>")]
pub async fn submit_feedback(
    submission: Json<FeedbackSubmission>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::SubmitFeedback)?;

    let id = requests::submit_feedback(db, user.id, &submission).await?;
    Ok(Json(Created { id }))
}

#[get("/feedback")]
pub async fn my_feedback(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Feedback>>, AppError> {
    user.require_permission(Permission::SubmitFeedback)?;

    Ok(Json(requests::feedback_history(db, user.id).await?))
}

#[get("/feedback/review?<role>")]
pub async fn review_feedback(
    role: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Feedback>>, AppError> {
    user.require_permission(Permission::ReviewRequests)?;

    let role = reviewable_role(role)?;
    Ok(Json(requests::feedback_for_role(db, role).await?))
}

#[put("/feedback/<id>/reply", data = "<reply>")]
pub async fn reply_to_feedback(
    id: i64,
    reply: Json<FeedbackReply>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Feedback>, AppError> {
    user.require_permission(Permission::ReviewRequests)?;

    Ok(Json(requests::reply_to_feedback(db, id, &reply).await?))
}

#[post("/notifications", data = "<notification>")]
pub async fn send_notification(
    notification: Json<NotificationInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::SendNotifications)?;

    let id = requests::send_notification(db, &notification).await?;
    Ok(Json(Created { id }))
}

#[get("/notifications")]
pub async fn my_notifications(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Notification>>, AppError> {
    user.require_permission(Permission::ViewOwnNotifications)?;

    Ok(Json(requests::notifications_for(db, user.id).await?))
}
