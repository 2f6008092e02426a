use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::auth::Role;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationResponse {
    pub status: String,
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResponse {
    pub fn new(errors: HashMap<String, Vec<String>>) -> Self {
        Self {
            status: "error".to_string(),
            errors,
        }
    }

    pub fn with_error(field: &str, message: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::new(errors)
    }
}

impl From<&FieldErrors> for ValidationResponse {
    fn from(errors: &FieldErrors) -> Self {
        Self::new(
            errors
                .0
                .iter()
                .map(|(field, messages)| (field.clone(), messages.clone()))
                .collect(),
        )
    }
}

/// Field name -> messages, the shape every rejected input is reported in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self(errors)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut map = BTreeMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .clone()
                        .unwrap_or_else(|| "Invalid value".into())
                        .to_string()
                })
                .collect();

            map.insert(field.to_string(), messages);
        }

        Self(map)
    }
}

pub fn invalid(field: &str, message: &str) -> AppError {
    AppError::InvalidArgument(FieldErrors::single(field, message))
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(field, "Date is required"));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| invalid(field, "Date must be formatted as YYYY-MM-DD"))
}

fn message(code: &'static str, text: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::from(text))
}

/// Rejects text that is empty once surrounding whitespace is dropped.
fn non_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(message("blank", "This field cannot be blank"))
    } else {
        Ok(())
    }
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    Role::from_str(role)
        .map(|_| ())
        .map_err(|_| message("role", "User type must be admin, staff or student"))
}

fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    match gender {
        "M" | "F" => Ok(()),
        _ => Err(message("gender", "Gender must be M or F")),
    }
}

fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    if !isbn.is_empty() && isbn.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(message("isbn", "ISBN must contain digits only"))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(
        length(max = 150, message = "First name is too long"),
        custom(function = "non_blank", message = "First name is required")
    )]
    pub first_name: String,
    #[validate(
        length(max = 150, message = "Last name is too long"),
        custom(function = "non_blank", message = "Last name is required")
    )]
    pub last_name: String,
    #[validate(custom(function = "validate_role"))]
    pub role: String,
    #[validate(custom(function = "validate_gender"))]
    pub gender: String,
    #[serde(default)]
    pub address: String,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
}

/// Admin edit of a staff or student account. A missing password keeps the old one.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: Option<String>,
    #[validate(
        length(max = 150, message = "First name is too long"),
        custom(function = "non_blank", message = "First name is required")
    )]
    pub first_name: String,
    #[validate(
        length(max = 150, message = "Last name is too long"),
        custom(function = "non_blank", message = "Last name is required")
    )]
    pub last_name: String,
    #[validate(custom(function = "validate_gender"))]
    pub gender: String,
    #[serde(default)]
    pub address: String,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
}

/// What any user may change on their own account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: Option<String>,
    #[validate(
        length(max = 150, message = "First name is too long"),
        custom(function = "non_blank", message = "First name is required")
    )]
    pub first_name: String,
    #[validate(
        length(max = 150, message = "Last name is too long"),
        custom(function = "non_blank", message = "Last name is required")
    )]
    pub last_name: String,
    #[validate(custom(function = "validate_gender"))]
    pub gender: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CourseInput {
    #[validate(
        length(max = 120, message = "Course name is too long"),
        custom(function = "non_blank", message = "Course name is required")
    )]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubjectInput {
    #[validate(
        length(max = 120, message = "Subject name is too long"),
        custom(function = "non_blank", message = "Subject name is required")
    )]
    pub name: String,
    pub course_id: i64,
    pub staff_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionInput {
    pub start_date: String,
    pub end_date: String,
}

impl SessionInput {
    pub fn parse(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        Ok((
            parse_date("start_date", &self.start_date)?,
            parse_date("end_date", &self.end_date)?,
        ))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LeaveApplication {
    pub date: String,
    #[validate(custom(function = "non_blank", message = "Reason for leave is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeedbackSubmission {
    #[validate(custom(function = "non_blank", message = "Feedback cannot be empty"))]
    pub feedback: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeedbackReply {
    #[validate(custom(function = "non_blank", message = "Reply cannot be empty"))]
    pub reply: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotificationInput {
    pub recipient_id: i64,
    #[validate(custom(function = "non_blank", message = "Message cannot be empty"))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBook {
    #[validate(
        length(max = 200, message = "Book name is too long"),
        custom(function = "non_blank", message = "Book name is required")
    )]
    pub name: String,
    #[validate(
        length(max = 200, message = "Author is too long"),
        custom(function = "non_blank", message = "Author is required")
    )]
    pub author: String,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    #[validate(
        length(max = 50, message = "Category is too long"),
        custom(function = "non_blank", message = "Category is required")
    )]
    pub category: String,
}

pub fn check_score(field: &str, score: f64) -> Result<(), AppError> {
    if !score.is_finite() || score < 0.0 {
        return Err(invalid(field, "Score must be a non-negative number"));
    }
    Ok(())
}
