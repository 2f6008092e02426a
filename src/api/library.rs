use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use super::Created;
use crate::auth::{Permission, Role, User};
use crate::clock::SharedClock;
use crate::error::AppError;
use crate::models::{Book, IssuedBookView};
use crate::validation::NewBook;
use crate::workflows::library::{self, FinePolicy};

#[derive(Debug, Serialize, Deserialize)]
pub struct IssueRequest {
    pub student_id: i64,
    pub isbn: String,
}

#[get("/books")]
pub async fn list_books(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Book>>, AppError> {
    user.require_permission(Permission::ViewBooks)?;

    Ok(Json(library::catalog(db).await?))
}

#[post("/books", data = "<book>")]
pub async fn add_book(
    book: Json<NewBook>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::ManageLibrary)?;

    let id = library::add_book(db, &book).await?;
    Ok(Json(Created { id }))
}

#[delete("/books/<id>")]
pub async fn delete_book(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    user.require_permission(Permission::ManageLibrary)?;

    library::remove_book(db, id).await?;
    Ok(Status::NoContent)
}

#[post("/books/issue", data = "<request>")]
pub async fn issue_book(
    request: Json<IssueRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    clock: &State<SharedClock>,
    policy: &State<FinePolicy>,
) -> Result<Json<Created>, AppError> {
    user.require_permission(Permission::ManageLibrary)?;

    let id = library::issue_book(
        db,
        clock.inner().as_ref(),
        policy,
        request.student_id,
        request.isbn.trim(),
    )
    .await?;
    Ok(Json(Created { id }))
}

/// Library managers see every loan; students see their own.
#[get("/books/issued")]
pub async fn issued_books(
    user: User,
    db: &State<Pool<Sqlite>>,
    clock: &State<SharedClock>,
    policy: &State<FinePolicy>,
) -> Result<Json<Vec<IssuedBookView>>, AppError> {
    let student_id = if user.has_permission(Permission::ManageLibrary) {
        None
    } else {
        user.require_role(Role::Student)?;
        Some(user.id)
    };

    Ok(Json(
        library::list_issued_books(db, clock.inner().as_ref(), policy, student_id).await?,
    ))
}
