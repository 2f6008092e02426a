pub mod academics;
pub mod attendance;
pub mod dashboard;
pub mod library;
pub mod requests;
pub mod results;
pub mod users;

use rocket::Route;
use rocket::serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::auth::{Role, User};
use crate::db;
use crate::error::AppError;
use crate::models::Subject;

/// Body returned by every create endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Created {
    pub id: i64,
}

#[get("/health")]
pub async fn health() -> &'static str {
    "OK"
}

/// Staff act only on subjects they teach; admins act on any subject.
pub(crate) async fn subject_for_actor(
    db: &Pool<Sqlite>,
    user: &User,
    subject_id: i64,
) -> Result<Subject, AppError> {
    let subject = db::get_subject(db, subject_id).await?;

    if user.role == Role::Staff && subject.staff_id != user.id {
        tracing::warn!(
            actor_id = user.id,
            subject_id,
            owner_id = subject.staff_id,
            "Staff member does not teach subject"
        );
        return Err(AppError::Authorization(format!(
            "You do not teach subject {}",
            subject.name
        )));
    }

    Ok(subject)
}

/// Staff may only look across a student's subjects when they teach in the
/// student's course. Other roles pass through.
pub(crate) async fn student_for_actor(
    db: &Pool<Sqlite>,
    user: &User,
    student_id: i64,
) -> Result<(), AppError> {
    if user.role != Role::Staff {
        return Ok(());
    }

    let student = db::get_user(db, student_id).await?;
    let taught = db::find_subjects_by_staff(db, user.id).await?;
    let teaches_course = student
        .course_id
        .is_some_and(|course_id| taught.iter().any(|subject| subject.course_id == course_id));

    if !teaches_course {
        tracing::warn!(actor_id = user.id, student_id, "Staff member does not teach student");
        return Err(AppError::Authorization(format!(
            "You do not teach {}",
            student.full_name()
        )));
    }

    Ok(())
}

pub fn routes() -> Vec<Route> {
    routes![
        health,
        academics::list_courses,
        academics::create_course,
        academics::rename_course,
        academics::delete_course,
        academics::list_sessions,
        academics::create_session,
        academics::edit_session,
        academics::delete_session,
        academics::list_subjects,
        academics::create_subject,
        academics::edit_subject,
        academics::delete_subject,
        users::me,
        users::update_profile,
        users::create_user,
        users::edit_user,
        users::delete_user,
        users::list_users,
        users::email_available,
        users::class_list,
        attendance::take_attendance,
        attendance::update_attendance,
        attendance::attendance_entries,
        attendance::attendance_dates,
        attendance::my_attendance,
        attendance::my_attendance_between,
        attendance::student_attendance,
        requests::apply_leave,
        requests::my_leave,
        requests::review_leave,
        requests::respond_to_leave,
        requests::submit_feedback,
        requests::my_feedback,
        requests::review_feedback,
        requests::reply_to_feedback,
        requests::send_notification,
        requests::my_notifications,
        library::list_books,
        library::add_book,
        library::delete_book,
        library::issue_book,
        library::issued_books,
        results::set_result,
        results::get_result,
        results::my_results,
        results::student_results,
        dashboard::dashboard,
    ]
}
