use chrono::{Days, NaiveDate};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};
use validator::Validate;

use super::{is_unique_violation, require_user_with_role};
use crate::auth::Role;
use crate::clock::Clock;
use crate::db;
use crate::error::AppError;
use crate::models::{Book, IssuedBookView};
use crate::validation::{NewBook, invalid};

/// Loan period and overdue charge applied to issued books.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinePolicy {
    pub loan_days: u32,
    pub rate_per_day: i64,
    pub cap: Option<i64>,
}

impl Default for FinePolicy {
    fn default() -> Self {
        Self {
            loan_days: 14,
            rate_per_day: 5,
            cap: None,
        }
    }
}

impl FinePolicy {
    pub fn expiry_for(&self, issued_date: NaiveDate) -> Result<NaiveDate, AppError> {
        issued_date
            .checked_add_days(Days::new(u64::from(self.loan_days)))
            .ok_or_else(|| AppError::Internal(format!("Loan period overflows from {}", issued_date)))
    }

    pub fn fine_for(&self, issued_date: NaiveDate, expiry_date: NaiveDate, today: NaiveDate) -> i64 {
        let fine = compute_fine(issued_date, expiry_date, today, self.rate_per_day);
        match self.cap {
            Some(cap) => fine.min(cap),
            None => fine,
        }
    }
}

/// Whole calendar days past `expiry_date`, times the daily rate. Never negative.
pub fn compute_fine(
    _issued_date: NaiveDate,
    expiry_date: NaiveDate,
    today: NaiveDate,
    rate_per_day: i64,
) -> i64 {
    let overdue_days = (today - expiry_date).num_days().max(0);
    overdue_days.saturating_mul(rate_per_day)
}

#[instrument(skip(pool))]
pub async fn add_book(pool: &Pool<Sqlite>, input: &NewBook) -> Result<i64, AppError> {
    input.validate()?;

    if db::find_book_by_isbn(pool, &input.isbn).await?.is_some() {
        return Err(invalid("isbn", "A book with this ISBN already exists"));
    }

    match db::insert_book(
        pool,
        input.name.trim(),
        input.author.trim(),
        &input.isbn,
        input.category.trim(),
    )
    .await
    {
        Ok(id) => Ok(id),
        Err(err) if is_unique_violation(&err) => {
            Err(invalid("isbn", "A book with this ISBN already exists"))
        }
        Err(err) => Err(err),
    }
}

#[instrument(skip(pool))]
pub async fn catalog(pool: &Pool<Sqlite>) -> Result<Vec<Book>, AppError> {
    db::list_books(pool).await
}

#[instrument(skip(pool))]
pub async fn remove_book(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    match db::delete_book(pool, id).await? {
        0 => Err(AppError::NotFound(format!("Book with id {} not found", id))),
        _ => Ok(()),
    }
}

/// Lends a catalogued book to a student from today for the policy's loan period.
#[instrument(skip(pool, clock, policy))]
pub async fn issue_book(
    pool: &Pool<Sqlite>,
    clock: &dyn Clock,
    policy: &FinePolicy,
    student_id: i64,
    isbn: &str,
) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    require_user_with_role(&mut *tx, student_id, Role::Student).await?;
    if db::find_book_by_isbn(&mut *tx, isbn).await?.is_none() {
        return Err(AppError::NotFound(format!("Book with ISBN {} not found", isbn)));
    }

    let issued_date = clock.today();
    let expiry_date = policy.expiry_for(issued_date)?;

    let id = db::insert_issued_book(&mut *tx, student_id, isbn, issued_date, expiry_date).await?;
    tx.commit().await?;

    info!(issue_id = id, %expiry_date, "Book issued");
    Ok(id)
}

/// Issued books with their fine as of `clock.today()`.
#[instrument(skip(pool, clock, policy))]
pub async fn list_issued_books(
    pool: &Pool<Sqlite>,
    clock: &dyn Clock,
    policy: &FinePolicy,
    student_id: Option<i64>,
) -> Result<Vec<IssuedBookView>, AppError> {
    let today = clock.today();
    let issues = db::list_issued_books(pool, student_id).await?;

    Ok(issues
        .into_iter()
        .map(|issue| {
            let fine = policy.fine_for(issue.issued_date, issue.expiry_date, today);
            IssuedBookView { issue, fine }
        })
        .collect())
}
