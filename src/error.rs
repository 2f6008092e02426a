use opentelemetry_semantic_conventions::{attribute::OTEL_STATUS_CODE, trace::ERROR_TYPE};
use rocket::http::Status;
use rocket::response::Responder;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use thiserror::Error;
use tracing::{Span, error, warn};

use crate::validation::{FieldErrors, ValidationResponse};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store failure: {0}")]
    StoreFailure(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(FieldErrors),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Duplicate attendance: {0}")]
    DuplicateAttendance(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn log_and_record(&self, ctx: &str) {
        let current_span = Span::current();
        let is_valid_span = !current_span.is_none();

        let message = self.to_string();
        let error_kind = match self {
            AppError::StoreFailure(err) => {
                error!(error = %message, context = %ctx, db_error = %err, "Store failure");
                "store_failure"
            }
            AppError::Authentication(msg) => {
                warn!(message = %msg, context = %ctx, "Authentication error");
                "authentication_error"
            }
            AppError::Authorization(msg) => {
                warn!(message = %msg, context = %ctx, "Authorization error");
                "authorization_error"
            }
            AppError::NotFound(msg) => {
                warn!(message = %msg, context = %ctx, "Not found error");
                "not_found_error"
            }
            AppError::InvalidArgument(errors) => {
                warn!(errors = %errors, context = %ctx, "Invalid argument");
                "invalid_argument"
            }
            AppError::InvalidTransition(msg) => {
                warn!(message = %msg, context = %ctx, "Invalid state transition");
                "invalid_transition"
            }
            AppError::DuplicateAttendance(msg) => {
                warn!(message = %msg, context = %ctx, "Duplicate attendance");
                "duplicate_attendance"
            }
            AppError::Internal(msg) => {
                error!(message = %msg, context = %ctx, "Internal server error");
                "internal_error"
            }
        };

        if is_valid_span {
            current_span.record("error", tracing::field::display(true));
            current_span.record(ERROR_TYPE, tracing::field::display(error_kind));
            current_span.record("error.message", tracing::field::display(&message));

            match self {
                AppError::StoreFailure(_) | AppError::Internal(_) => {
                    current_span.record(OTEL_STATUS_CODE, tracing::field::display("ERROR"));
                }
                _ => {}
            }
        }
    }

    pub fn status_code(&self) -> Status {
        match self {
            AppError::StoreFailure(_) => Status::InternalServerError,
            AppError::Authentication(_) => Status::Unauthorized,
            AppError::Authorization(_) => Status::Forbidden,
            AppError::NotFound(_) => Status::NotFound,
            AppError::InvalidArgument(_) => Status::UnprocessableEntity,
            AppError::InvalidTransition(_) => Status::Conflict,
            AppError::DuplicateAttendance(_) => Status::Conflict,
            AppError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn to_status_with_log(&self, context: &str) -> Status {
        self.log_and_record(context);
        self.status_code()
    }

    /// Builds the JSON body sent to the portal. Store and internal failures
    /// never leak driver messages.
    pub fn to_validation_response(&self) -> ValidationResponse {
        match self {
            AppError::StoreFailure(_) | AppError::Internal(_) => {
                ValidationResponse::with_error("server", "could not complete operation")
            }
            AppError::Authentication(msg) => ValidationResponse::with_error("authentication", msg),
            AppError::Authorization(msg) => ValidationResponse::with_error("permission", msg),
            AppError::NotFound(msg) => ValidationResponse::with_error("resource", msg),
            AppError::InvalidArgument(errors) => ValidationResponse::from(errors),
            AppError::InvalidTransition(msg) => ValidationResponse::with_error("status", msg),
            AppError::DuplicateAttendance(msg) => ValidationResponse::with_error("date", msg),
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        let status = self.to_status_with_log(&format!("Request to {} {}", req.method(), req.uri()));
        Custom(status, Json(self.to_validation_response())).respond_to(req)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidArgument(FieldErrors::from(errors))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Cryptography error: {}", error))
    }
}
