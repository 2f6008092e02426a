use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Book, IssuedBook};

#[instrument(skip(executor))]
pub async fn insert_book<'e, E>(
    executor: E,
    name: &str,
    author: &str,
    isbn: &str,
    category: &str,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Adding book to catalog");
    let res = sqlx::query("INSERT INTO books (name, author, isbn, category) VALUES (?, ?, ?, ?)")
        .bind(name)
        .bind(author)
        .bind(isbn)
        .bind(category)
        .execute(executor)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn find_book_by_isbn<'e, E>(executor: E, isbn: &str) -> Result<Option<Book>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Finding book by ISBN");
    let row = sqlx::query_as::<_, Book>(
        "SELECT id, name, author, isbn, category FROM books WHERE isbn = ?",
    )
    .bind(isbn)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

#[instrument(skip(executor))]
pub async fn list_books<'e, E>(executor: E) -> Result<Vec<Book>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting book catalog");
    let rows = sqlx::query_as::<_, Book>(
        "SELECT id, name, author, isbn, category FROM books ORDER BY name",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

#[instrument(skip(executor))]
pub async fn delete_book<'e, E>(executor: E, id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Deleting book");
    let res = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(executor))]
pub async fn insert_issued_book<'e, E>(
    executor: E,
    student_id: i64,
    isbn: &str,
    issued_date: NaiveDate,
    expiry_date: NaiveDate,
) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Recording issued book");
    let res = sqlx::query(
        "INSERT INTO issued_books (student_id, isbn, issued_date, expiry_date) VALUES (?, ?, ?, ?)",
    )
    .bind(student_id)
    .bind(isbn)
    .bind(issued_date)
    .bind(expiry_date)
    .execute(executor)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn list_issued_books<'e, E>(
    executor: E,
    student_id: Option<i64>,
) -> Result<Vec<IssuedBook>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    info!("Getting issued books");
    let rows = sqlx::query_as::<_, IssuedBook>(
        "SELECT i.id, i.student_id, u.first_name || ' ' || u.last_name AS student_name,
            i.isbn, COALESCE(b.name, '') AS book_name, i.issued_date, i.expiry_date
         FROM issued_books i
         JOIN users u ON u.id = i.student_id
         LEFT JOIN books b ON b.isbn = i.isbn
         WHERE (? IS NULL OR i.student_id = ?)
         ORDER BY i.expiry_date, i.id",
    )
    .bind(student_id)
    .bind(student_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
