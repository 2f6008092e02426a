use sqlx::{Executor, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::Notification;

#[instrument(skip(executor, message))]
pub async fn insert_notification<'e, E>(
    executor: E,
    recipient_id: i64,
    message: &str,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Storing notification");
    let res = sqlx::query("INSERT INTO notifications (recipient_id, message) VALUES (?, ?)")
        .bind(recipient_id)
        .bind(message)
        .execute(executor)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn list_notifications<'e, E>(
    executor: E,
    recipient_id: i64,
) -> Result<Vec<Notification>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting notifications");
    let rows = sqlx::query_as::<_, Notification>(
        "SELECT id, recipient_id, message, created_at FROM notifications
         WHERE recipient_id = ?
         ORDER BY created_at DESC, id DESC",
    )
    .bind(recipient_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
