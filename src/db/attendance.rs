use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Attendance, AttendanceDay, AttendanceEntry, SubjectAttendance};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct SubjectActivity {
    pub subject_id: i64,
    pub subject_name: String,
    pub attendance_taken: i64,
}

#[instrument(skip(executor))]
pub async fn find_attendance<'e, E>(
    executor: E,
    subject_id: i64,
    date: NaiveDate,
) -> Result<Option<Attendance>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Looking up attendance for subject and date");
    let row = sqlx::query_as::<_, Attendance>(
        "SELECT id, subject_id, session_id, date FROM attendance
         WHERE subject_id = ? AND date = ?",
    )
    .bind(subject_id)
    .bind(date)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

#[instrument(skip(executor))]
pub async fn get_attendance<'e, E>(executor: E, id: i64) -> Result<Attendance, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Fetching attendance");
    sqlx::query_as::<_, Attendance>(
        "SELECT id, subject_id, session_id, date FROM attendance WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Attendance with id {} not found", id)))
}

#[instrument(skip(executor))]
pub async fn insert_attendance<'e, E>(
    executor: E,
    subject_id: i64,
    session_id: i64,
    date: NaiveDate,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Creating attendance");
    let res = sqlx::query("INSERT INTO attendance (subject_id, session_id, date) VALUES (?, ?, ?)")
        .bind(subject_id)
        .bind(session_id)
        .bind(date)
        .execute(executor)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn insert_attendance_report<'e, E>(
    executor: E,
    student_id: i64,
    attendance_id: i64,
    status: bool,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO attendance_reports (student_id, attendance_id, status) VALUES (?, ?, ?)",
    )
    .bind(student_id)
    .bind(attendance_id)
    .bind(status)
    .execute(executor)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Returns the number of reports changed; zero means the student has no
/// report under this attendance.
#[instrument(skip(executor))]
pub async fn set_report_status<'e, E>(
    executor: E,
    attendance_id: i64,
    student_id: i64,
    status: bool,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Updating attendance report");
    let res = sqlx::query(
        "UPDATE attendance_reports
         SET status = ?, updated_at = CURRENT_TIMESTAMP
         WHERE attendance_id = ? AND student_id = ?",
    )
    .bind(status)
    .bind(attendance_id)
    .bind(student_id)
    .execute(executor)
    .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn list_attendance_entries<'e, E>(
    executor: E,
    attendance_id: i64,
) -> Result<Vec<AttendanceEntry>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting attendance entries");
    let rows = sqlx::query_as::<_, AttendanceEntry>(
        "SELECT r.student_id, u.first_name || ' ' || u.last_name AS student_name, r.status
         FROM attendance_reports r
         JOIN users u ON u.id = r.student_id
         WHERE r.attendance_id = ?
         ORDER BY student_name, r.student_id",
    )
    .bind(attendance_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

#[instrument(skip(executor))]
pub async fn list_attendance_dates<'e, E>(
    executor: E,
    subject_id: i64,
    session_id: i64,
) -> Result<Vec<Attendance>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting attendance dates");
    let rows = sqlx::query_as::<_, Attendance>(
        "SELECT id, subject_id, session_id, date FROM attendance
         WHERE subject_id = ? AND session_id = ?
         ORDER BY date",
    )
    .bind(subject_id)
    .bind(session_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// (present, total) report counts for a student, optionally for one subject.
#[instrument(skip(executor))]
pub async fn count_student_attendance<'e, E>(
    executor: E,
    student_id: i64,
    subject_id: Option<i64>,
) -> Result<(i64, i64), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Counting student attendance");
    let counts: (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(CASE WHEN r.status THEN 1 ELSE 0 END), 0), COUNT(r.id)
         FROM attendance_reports r
         JOIN attendance a ON a.id = r.attendance_id
         WHERE r.student_id = ? AND (? IS NULL OR a.subject_id = ?)",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(subject_id)
    .fetch_one(executor)
    .await?;

    Ok(counts)
}

/// One student's marks for a subject between two dates, both inclusive.
#[instrument(skip(executor))]
pub async fn list_student_attendance_between<'e, E>(
    executor: E,
    student_id: i64,
    subject_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<AttendanceDay>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting student attendance for date range");
    let rows = sqlx::query_as::<_, AttendanceDay>(
        "SELECT a.date, r.status
         FROM attendance_reports r
         JOIN attendance a ON a.id = r.attendance_id
         WHERE r.student_id = ? AND a.subject_id = ? AND a.date BETWEEN ? AND ?
         ORDER BY a.date",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Present/absent counts per subject of the given course for one student.
#[instrument(skip(executor))]
pub async fn subject_attendance_for_student<'e, E>(
    executor: E,
    student_id: i64,
    course_id: i64,
) -> Result<Vec<SubjectAttendance>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Summarising attendance per subject");
    let rows = sqlx::query_as::<_, SubjectAttendance>(
        "SELECT s.id AS subject_id, s.name AS subject_name,
            COALESCE(SUM(CASE WHEN r.status THEN 1 ELSE 0 END), 0) AS present,
            COALESCE(SUM(CASE WHEN r.id IS NOT NULL AND NOT r.status THEN 1 ELSE 0 END), 0) AS absent
         FROM subjects s
         LEFT JOIN attendance a ON a.subject_id = s.id
         LEFT JOIN attendance_reports r ON r.attendance_id = a.id AND r.student_id = ?
         WHERE s.course_id = ?
         GROUP BY s.id, s.name
         ORDER BY s.name",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Attendance events taken per subject; `staff_id` narrows to one teacher.
#[instrument(skip(executor))]
pub async fn count_attendance_by_subject<'e, E>(
    executor: E,
    staff_id: Option<i64>,
) -> Result<Vec<SubjectActivity>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Counting attendance per subject");
    let rows = sqlx::query_as::<_, SubjectActivity>(
        "SELECT s.id AS subject_id, s.name AS subject_name, COUNT(a.id) AS attendance_taken
         FROM subjects s
         LEFT JOIN attendance a ON a.subject_id = s.id
         WHERE (? IS NULL OR s.staff_id = ?)
         GROUP BY s.id, s.name
         ORDER BY s.name",
    )
    .bind(staff_id)
    .bind(staff_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
