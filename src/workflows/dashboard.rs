use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use super::attendance::{attendance_summary, subject_attendance_summaries};
use super::require_user_with_role;
use crate::auth::Role;
use crate::db::{self, SubjectActivity};
use crate::error::AppError;
use crate::models::{AttendanceSummary, Subject, SubjectAttendance};

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub total_students: i64,
    pub total_staff: i64,
    pub total_courses: i64,
    pub total_subjects: i64,
    pub attendance_by_subject: Vec<SubjectActivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffDashboard {
    pub subjects: Vec<Subject>,
    pub total_students: i64,
    pub attendance_by_subject: Vec<SubjectActivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub overall: AttendanceSummary,
    pub subjects: Vec<SubjectAttendance>,
}

#[instrument(skip(pool))]
pub async fn admin_dashboard(pool: &Pool<Sqlite>) -> Result<AdminDashboard, AppError> {
    Ok(AdminDashboard {
        total_students: db::count_users_by_role(pool, Role::Student).await?,
        total_staff: db::count_users_by_role(pool, Role::Staff).await?,
        total_courses: db::count_courses(pool).await?,
        total_subjects: db::count_subjects(pool).await?,
        attendance_by_subject: db::count_attendance_by_subject(pool, None).await?,
    })
}

/// Students are counted once per distinct course the staff member teaches in.
#[instrument(skip(pool))]
pub async fn staff_dashboard(pool: &Pool<Sqlite>, staff_id: i64) -> Result<StaffDashboard, AppError> {
    require_user_with_role(pool, staff_id, Role::Staff).await?;

    let subjects = db::find_subjects_by_staff(pool, staff_id).await?;

    let mut course_ids: Vec<i64> = subjects.iter().map(|s| s.course_id).collect();
    course_ids.sort_unstable();
    course_ids.dedup();

    let mut total_students = 0;
    for course_id in course_ids {
        total_students += db::count_students_in_course(pool, course_id).await?;
    }

    Ok(StaffDashboard {
        subjects,
        total_students,
        attendance_by_subject: db::count_attendance_by_subject(pool, Some(staff_id)).await?,
    })
}

#[instrument(skip(pool))]
pub async fn student_dashboard(
    pool: &Pool<Sqlite>,
    student_id: i64,
) -> Result<StudentDashboard, AppError> {
    let subjects = subject_attendance_summaries(pool, student_id).await?;
    let (present, total) = db::count_student_attendance(pool, student_id, None).await?;

    Ok(StudentDashboard {
        overall: attendance_summary(present, total),
        subjects,
    })
}
