use chrono::NaiveDate;
use sqlx::{Executor, Pool, Sqlite};
use tracing::{info, instrument};
use validator::Validate;

use super::{is_unique_violation, require_user_with_role};
use crate::auth::{Role, User};
use crate::db::{self, UserDetails, UserRecord};
use crate::error::AppError;
use crate::validation::{CourseInput, NewUser, ProfileUpdate, SubjectInput, UserUpdate, invalid};

#[cfg(not(test))]
const PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const PASSWORD_COST: u32 = 4;

#[instrument(skip(pool))]
pub async fn create_course(pool: &Pool<Sqlite>, input: &CourseInput) -> Result<i64, AppError> {
    input.validate()?;
    info!("Creating course");
    db::insert_course(pool, input.name.trim()).await
}

#[instrument(skip(pool))]
pub async fn rename_course(pool: &Pool<Sqlite>, id: i64, input: &CourseInput) -> Result<(), AppError> {
    input.validate()?;
    match db::update_course_name(pool, id, input.name.trim()).await? {
        0 => Err(AppError::NotFound(format!("Course with id {} not found", id))),
        _ => Ok(()),
    }
}

#[instrument(skip(pool))]
pub async fn remove_course(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    match db::delete_course(pool, id).await? {
        0 => Err(AppError::NotFound(format!("Course with id {} not found", id))),
        _ => Ok(()),
    }
}

/// Session bounds must be strictly ordered on every write path.
pub fn check_session_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), AppError> {
    if start_date >= end_date {
        return Err(invalid("start_date", "Start date must be before end date"));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn create_session(
    pool: &Pool<Sqlite>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<i64, AppError> {
    check_session_dates(start_date, end_date)?;
    info!("Creating academic session");
    db::insert_session(pool, start_date, end_date).await
}

#[instrument(skip(pool))]
pub async fn edit_session(
    pool: &Pool<Sqlite>,
    id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), AppError> {
    check_session_dates(start_date, end_date)?;
    match db::update_session(pool, id, start_date, end_date).await? {
        0 => Err(AppError::NotFound(format!("Session with id {} not found", id))),
        _ => Ok(()),
    }
}

#[instrument(skip(pool))]
pub async fn remove_session(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    match db::delete_session(pool, id).await? {
        0 => Err(AppError::NotFound(format!("Session with id {} not found", id))),
        _ => Ok(()),
    }
}

#[instrument(skip(pool))]
pub async fn create_subject(pool: &Pool<Sqlite>, input: &SubjectInput) -> Result<i64, AppError> {
    input.validate()?;

    let mut tx = pool.begin().await?;
    db::get_course(&mut *tx, input.course_id).await?;
    require_user_with_role(&mut *tx, input.staff_id, Role::Staff).await?;

    let id = db::insert_subject(&mut *tx, input.name.trim(), input.course_id, input.staff_id).await?;
    tx.commit().await?;

    info!(subject_id = id, "Subject created");
    Ok(id)
}

#[instrument(skip(pool))]
pub async fn edit_subject(pool: &Pool<Sqlite>, id: i64, input: &SubjectInput) -> Result<(), AppError> {
    input.validate()?;

    let mut tx = pool.begin().await?;
    db::get_course(&mut *tx, input.course_id).await?;
    require_user_with_role(&mut *tx, input.staff_id, Role::Staff).await?;

    let updated =
        db::update_subject(&mut *tx, id, input.name.trim(), input.course_id, input.staff_id).await?;
    if updated == 0 {
        return Err(AppError::NotFound(format!("Subject with id {} not found", id)));
    }
    tx.commit().await?;

    info!("Subject updated");
    Ok(())
}

#[instrument(skip(pool))]
pub async fn remove_subject(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    match db::delete_subject(pool, id).await? {
        0 => Err(AppError::NotFound(format!("Subject with id {} not found", id))),
        _ => Ok(()),
    }
}

/// Whether an account already uses `email`.
#[instrument(skip(pool))]
pub async fn email_in_use(pool: &Pool<Sqlite>, email: &str) -> Result<bool, AppError> {
    Ok(db::find_user_by_email(pool, email).await?.is_some())
}

#[instrument(skip_all, fields(email = %input.email, role = %input.role))]
pub async fn create_user(pool: &Pool<Sqlite>, input: &NewUser) -> Result<i64, AppError> {
    input.validate()?;
    let role = Role::from_str(&input.role)
        .map_err(|_| invalid("role", "User type must be admin, staff or student"))?;

    let mut tx = pool.begin().await?;

    if db::find_user_by_email(&mut *tx, &input.email).await?.is_some() {
        return Err(invalid("email", "This email is already registered"));
    }

    let (course_id, session_id) = match role {
        Role::Admin => (None, None),
        Role::Staff => (input.course_id, None),
        Role::Student => (input.course_id, input.session_id),
    };
    if let Some(course_id) = course_id {
        db::get_course(&mut *tx, course_id).await?;
    }
    if let Some(session_id) = session_id {
        db::get_session(&mut *tx, session_id).await?;
    }

    let password_hash = bcrypt::hash(&input.password, PASSWORD_COST)?;

    let record = UserRecord {
        email: &input.email,
        password_hash: &password_hash,
        first_name: input.first_name.trim(),
        last_name: input.last_name.trim(),
        role,
        gender: &input.gender,
        address: input.address.trim(),
        course_id,
        session_id,
    };

    let id = match db::insert_user(&mut *tx, &record).await {
        Ok(id) => id,
        Err(err) if is_unique_violation(&err) => {
            return Err(invalid("email", "This email is already registered"));
        }
        Err(err) => return Err(err),
    };
    tx.commit().await?;

    info!(user_id = id, "User created");
    Ok(id)
}

/// Loads a staff or student account. Admin accounts are not editable here.
async fn managed_user<'e, E>(executor: E, id: i64) -> Result<User, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    match db::get_user(executor, id).await {
        Ok(user) if user.role != Role::Admin => Ok(user),
        Ok(_) | Err(AppError::NotFound(_)) => {
            Err(AppError::NotFound(format!("Staff or student with id {} not found", id)))
        }
        Err(err) => Err(err),
    }
}

#[instrument(skip_all, fields(user_id = id, email = %input.email))]
pub async fn edit_user(pool: &Pool<Sqlite>, id: i64, input: &UserUpdate) -> Result<(), AppError> {
    input.validate()?;

    let mut tx = pool.begin().await?;
    let user = managed_user(&mut *tx, id).await?;

    if let Some(owner) = db::find_user_by_email(&mut *tx, &input.email).await? {
        if owner.id != id {
            return Err(invalid("email", "This email is already registered"));
        }
    }

    let session_id = match user.role {
        Role::Student => input.session_id,
        _ => None,
    };
    if let Some(course_id) = input.course_id {
        db::get_course(&mut *tx, course_id).await?;
    }
    if let Some(session_id) = session_id {
        db::get_session(&mut *tx, session_id).await?;
    }

    let details = UserDetails {
        email: &input.email,
        first_name: input.first_name.trim(),
        last_name: input.last_name.trim(),
        gender: &input.gender,
        address: input.address.trim(),
        course_id: input.course_id,
        session_id,
    };
    match db::update_user_details(&mut *tx, id, &details).await {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            return Err(invalid("email", "This email is already registered"));
        }
        Err(err) => return Err(err),
    }

    if let Some(password) = &input.password {
        let password_hash = bcrypt::hash(password, PASSWORD_COST)?;
        db::update_user_password(&mut *tx, id, &password_hash).await?;
    }
    tx.commit().await?;

    info!("User updated");
    Ok(())
}

/// Updates the caller's own name, gender, address and optionally password.
/// Email, role and enrolment stay as they are.
#[instrument(skip_all, fields(user_id = user_id))]
pub async fn update_profile(
    pool: &Pool<Sqlite>,
    user_id: i64,
    input: &ProfileUpdate,
) -> Result<(), AppError> {
    input.validate()?;

    let mut tx = pool.begin().await?;
    let user = db::get_user(&mut *tx, user_id).await?;

    let details = UserDetails {
        email: &user.email,
        first_name: input.first_name.trim(),
        last_name: input.last_name.trim(),
        gender: &input.gender,
        address: input.address.trim(),
        course_id: user.course_id,
        session_id: user.session_id,
    };
    db::update_user_details(&mut *tx, user_id, &details).await?;

    if let Some(password) = &input.password {
        let password_hash = bcrypt::hash(password, PASSWORD_COST)?;
        db::update_user_password(&mut *tx, user_id, &password_hash).await?;
    }
    tx.commit().await?;

    info!("Profile updated");
    Ok(())
}

/// Deletes a staff or student account along with everything that references it.
#[instrument(skip(pool))]
pub async fn remove_user(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    managed_user(&mut *tx, id).await?;
    db::delete_user(&mut *tx, id).await?;
    tx.commit().await?;

    info!("User removed");
    Ok(())
}
