use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use sqlx::SqlitePool;

use crate::db::get_user;
use crate::validation::ValidationResponse;

use super::User;

/// Header carrying the acting user's id, set by the upstream auth layer.
pub const ACTOR_HEADER: &str = "X-Actor-Id";

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("actor_guard");
        let _guard = auth_span.enter();

        let actor_id = match request
            .headers()
            .get_one(ACTOR_HEADER)
            .and_then(|value| value.trim().parse::<i64>().ok())
        {
            Some(id) => id,
            None => {
                tracing::warn!("Request without a usable actor header");
                return Outcome::Error((Status::Unauthorized, ()));
            }
        };

        let db = match request.rocket().state::<SqlitePool>() {
            Some(pool) => pool,
            _ => {
                tracing::error!("Database pool not found in managed state");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        match get_user(db, actor_id).await {
            Ok(user) => {
                tracing::info!(actor_id = %user.id, role = %user.role.as_str(), "Actor resolved");
                Outcome::Success(user)
            }
            Err(crate::error::AppError::NotFound(_)) => {
                tracing::warn!(actor_id = %actor_id, "Unknown actor");
                Outcome::Error((Status::Unauthorized, ()))
            }
            Err(err) => {
                tracing::error!(actor_id = %actor_id, error = ?err, "Failed to load actor");
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::Unauthorized,
        Json(ValidationResponse::with_error(
            "authentication",
            "Authentication required",
        )),
    )
}

#[catch(422)]
pub fn unprocessable_api(_req: &Request) -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::UnprocessableEntity,
        Json(ValidationResponse::with_error(
            "request",
            "Request body could not be parsed",
        )),
    )
}

#[catch(500)]
pub fn internal_error_api(_req: &Request) -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::InternalServerError,
        Json(ValidationResponse::with_error(
            "server",
            "could not complete operation",
        )),
    )
}

#[catch(404)]
pub fn not_found_api(req: &Request) -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::NotFound,
        Json(ValidationResponse::with_error(
            "resource",
            &format!("No endpoint at {}", req.uri().path()),
        )),
    )
}
