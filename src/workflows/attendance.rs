use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

use super::{is_unique_violation, require_user_with_role};
use crate::auth::Role;
use crate::db;
use crate::error::AppError;
use crate::models::{
    Attendance, AttendanceDay, AttendanceEntry, AttendanceSummary, SubjectAttendance,
};
use crate::validation::invalid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub student_id: i64,
    pub status: bool,
}

fn duplicate(subject_id: i64, date: NaiveDate) -> AppError {
    AppError::DuplicateAttendance(format!(
        "Attendance for subject {} on {} has already been taken",
        subject_id, date
    ))
}

/// Records one roll call: an attendance row plus a report for every student
/// enrolled in the subject's course for `session_id`. All or nothing.
#[instrument(skip(pool, present_student_ids))]
pub async fn take_attendance(
    pool: &Pool<Sqlite>,
    subject_id: i64,
    session_id: i64,
    date: NaiveDate,
    present_student_ids: &HashSet<i64>,
) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let subject = db::get_subject(&mut *tx, subject_id).await?;
    db::get_session(&mut *tx, session_id).await?;

    if db::find_attendance(&mut *tx, subject_id, date).await?.is_some() {
        return Err(duplicate(subject_id, date));
    }

    let students =
        db::find_students_by_course_session(&mut *tx, subject.course_id, session_id).await?;
    let enrolled: HashSet<i64> = students.iter().map(|s| s.id).collect();

    let mut strangers: Vec<i64> = present_student_ids
        .difference(&enrolled)
        .copied()
        .collect();
    if !strangers.is_empty() {
        strangers.sort_unstable();
        warn!(?strangers, "Present list names students outside the class");
        return Err(invalid(
            "present_student_ids",
            &format!("Students {:?} are not enrolled in this subject", strangers),
        ));
    }

    let attendance_id = match db::insert_attendance(&mut *tx, subject_id, session_id, date).await {
        Ok(id) => id,
        Err(err) if is_unique_violation(&err) => return Err(duplicate(subject_id, date)),
        Err(err) => return Err(err),
    };

    for student in &students {
        let present = present_student_ids.contains(&student.id);
        db::insert_attendance_report(&mut *tx, student.id, attendance_id, present).await?;
    }

    tx.commit().await?;

    info!(
        attendance_id,
        students = students.len(),
        present = present_student_ids.len(),
        "Attendance taken"
    );
    Ok(attendance_id)
}

/// Overwrites individual statuses. Fails without applying anything when the
/// attendance or any referenced report is missing.
#[instrument(skip(pool, changes))]
pub async fn update_attendance(
    pool: &Pool<Sqlite>,
    attendance_id: i64,
    changes: &[StatusChange],
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    db::get_attendance(&mut *tx, attendance_id).await?;

    for change in changes {
        let updated =
            db::set_report_status(&mut *tx, attendance_id, change.student_id, change.status)
                .await?;
        if updated == 0 {
            return Err(AppError::NotFound(format!(
                "No attendance report for student {} under attendance {}",
                change.student_id, attendance_id
            )));
        }
    }

    tx.commit().await?;

    info!(changes = changes.len(), "Attendance updated");
    Ok(())
}

#[instrument(skip(pool))]
pub async fn fetch_attendance_for_date(
    pool: &Pool<Sqlite>,
    attendance_id: i64,
) -> Result<Vec<AttendanceEntry>, AppError> {
    db::get_attendance(pool, attendance_id).await?;
    db::list_attendance_entries(pool, attendance_id).await
}

#[instrument(skip(pool))]
pub async fn list_attendance_dates(
    pool: &Pool<Sqlite>,
    subject_id: i64,
    session_id: i64,
) -> Result<Vec<Attendance>, AppError> {
    db::get_subject(pool, subject_id).await?;
    db::get_session(pool, session_id).await?;
    db::list_attendance_dates(pool, subject_id, session_id).await
}

fn percent(part: i64, total: i64) -> i64 {
    ((part as f64 / total as f64) * 100.0).round() as i64
}

pub fn attendance_summary(present_count: i64, total_count: i64) -> AttendanceSummary {
    if total_count <= 0 {
        return AttendanceSummary::default();
    }

    let percent_present = percent(present_count, total_count);
    AttendanceSummary {
        present_count,
        total_count,
        percent_present,
        percent_absent: 100 - percent_present,
    }
}

#[instrument(skip(pool))]
pub async fn compute_attendance_percentage(
    pool: &Pool<Sqlite>,
    student_id: i64,
    subject_id: Option<i64>,
) -> Result<AttendanceSummary, AppError> {
    require_user_with_role(pool, student_id, Role::Student).await?;
    if let Some(subject_id) = subject_id {
        db::get_subject(pool, subject_id).await?;
    }

    let (present, total) = db::count_student_attendance(pool, student_id, subject_id).await?;
    Ok(attendance_summary(present, total))
}

/// Per-subject present/absent counts across the student's course.
#[instrument(skip(pool))]
pub async fn subject_attendance_summaries(
    pool: &Pool<Sqlite>,
    student_id: i64,
) -> Result<Vec<SubjectAttendance>, AppError> {
    let student = require_user_with_role(pool, student_id, Role::Student).await?;

    match student.course_id {
        Some(course_id) => db::subject_attendance_for_student(pool, student_id, course_id).await,
        None => Ok(Vec::new()),
    }
}

/// A student's mark for each date the subject was taken between `start_date`
/// and `end_date`, inclusive, oldest first.
#[instrument(skip(pool))]
pub async fn student_attendance_between(
    pool: &Pool<Sqlite>,
    student_id: i64,
    subject_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<AttendanceDay>, AppError> {
    if start_date > end_date {
        return Err(invalid("start_date", "Start date must not be after end date"));
    }
    require_user_with_role(pool, student_id, Role::Student).await?;
    db::get_subject(pool, subject_id).await?;

    db::list_student_attendance_between(pool, student_id, subject_id, start_date, end_date).await
}
