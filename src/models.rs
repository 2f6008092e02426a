use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
}

/// An academic term, not a login session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AcademicSession {
    pub id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl fmt::Display for AcademicSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "From {} to {}", self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub course_id: i64,
    pub course_name: String,
    pub staff_id: i64,
    pub staff_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: i64,
    pub subject_id: i64,
    pub session_id: i64,
    pub date: NaiveDate,
}

/// One row of a taken roll as shown to staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub student_name: String,
    pub status: bool,
}

/// A student's mark on one taken date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceDay {
    pub date: NaiveDate,
    pub status: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub present_count: i64,
    pub total_count: i64,
    pub percent_present: i64,
    pub percent_absent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubjectAttendance {
    pub subject_id: i64,
    pub subject_name: String,
    pub present: i64,
    pub absent: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn code(&self) -> i64 {
        match self {
            LeaveStatus::Pending => 0,
            LeaveStatus::Approved => 1,
            LeaveStatus::Rejected => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(LeaveStatus::Pending),
            1 => Some(LeaveStatus::Approved),
            -1 => Some(LeaveStatus::Rejected),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn outcome(&self) -> LeaveStatus {
        match self {
            Decision::Approve => LeaveStatus::Approved,
            Decision::Reject => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveReport {
    pub id: i64,
    pub owner_id: i64,
    pub owner_name: String,
    pub owner_role: String,
    pub date: NaiveDate,
    pub message: String,
    pub status: LeaveStatus,
    pub status_label: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbLeaveReport {
    pub id: Option<i64>,
    pub owner_id: Option<i64>,
    pub owner_name: Option<String>,
    pub owner_role: Option<String>,
    pub date: Option<NaiveDate>,
    pub message: Option<String>,
    pub status: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbLeaveReport> for LeaveReport {
    fn from(db: DbLeaveReport) -> Self {
        // The table's CHECK constraint keeps status within the three codes.
        let status = db
            .status
            .and_then(LeaveStatus::from_code)
            .unwrap_or(LeaveStatus::Pending);

        Self {
            id: db.id.unwrap_or_default(),
            owner_id: db.owner_id.unwrap_or_default(),
            owner_name: db.owner_name.unwrap_or_default(),
            owner_role: db.owner_role.unwrap_or_default(),
            date: db.date.unwrap_or_default(),
            message: db.message.unwrap_or_default(),
            status,
            status_label: status.label().to_string(),
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackState {
    Unanswered,
    Answered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub owner_id: i64,
    pub owner_name: String,
    pub owner_role: String,
    pub feedback: String,
    pub reply: Option<String>,
    pub state: FeedbackState,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbFeedback {
    pub id: Option<i64>,
    pub owner_id: Option<i64>,
    pub owner_name: Option<String>,
    pub owner_role: Option<String>,
    pub feedback: Option<String>,
    pub reply: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbFeedback> for Feedback {
    fn from(db: DbFeedback) -> Self {
        let state = match db.reply {
            Some(_) => FeedbackState::Answered,
            None => FeedbackState::Unanswered,
        };

        Self {
            id: db.id.unwrap_or_default(),
            owner_id: db.owner_id.unwrap_or_default(),
            owner_name: db.owner_name.unwrap_or_default(),
            owner_role: db.owner_role.unwrap_or_default(),
            feedback: db.feedback.unwrap_or_default(),
            reply: db.reply,
            state,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub message: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.isbn)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssuedBook {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub isbn: String,
    pub book_name: String,
    pub issued_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

/// An issued book with its fine as of the day it was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedBookView {
    #[serde(flatten)]
    pub issue: IssuedBook,
    pub fine: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentResult {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub session_id: i64,
    pub test: f64,
    pub exam: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResultLine {
    pub subject_id: i64,
    pub subject_name: String,
    pub session_id: i64,
    pub test: f64,
    pub exam: f64,
    pub total: f64,
}
