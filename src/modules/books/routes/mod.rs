//! HTTP handlers for `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use library_http::{
    error::{AppError, INVALID_BODY_MESSAGE},
    extract::ApiJson,
};
use serde_json::json;

use super::models::Book;
use super::store::{BookStore, StoreError};

/// Public path of the collection, used for `Location` headers.
pub const BOOKS_PATH: &str = "/api/books";

const INVALID_ID: &str = "Validation Error: Id must be a positive number.";
const DUPLICATE_ID: &str = "Conflict on the Server: A book with this Id already exists.";
const DUPLICATE_TITLE: &str = "Conflict on the Server: A book with this title already exists.";
const UPDATE_FAILED: &str = "Database Error: An issue occurred while updating the book.";
const DELETE_FAILED: &str = "Database Error: Unable to delete the book.";

type SharedStore = Arc<dyn BookStore>;

/// Routes relative to the module mount point.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(replace_book).delete(delete_book),
        )
        .with_state(store)
}

async fn list_books(State(store): State<SharedStore>) -> Result<Json<Vec<Book>>, AppError> {
    let books = store.list_all().await.map_err(storage_fault)?;
    Ok(Json(books))
}

async fn get_book(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    ensure_positive(id)?;

    match store.get_by_id(id).await {
        Ok(Some(book)) => Ok(Json(book)),
        Ok(None) => Err(AppError::not_found(format!(
            "Resource Not Found: A book with id {id} does not exist."
        ))),
        Err(e) => Err(storage_fault(e)),
    }
}

async fn create_book(
    State(store): State<SharedStore>,
    ApiJson(book): ApiJson<Book>,
) -> Result<impl IntoResponse, AppError> {
    validate(&book)?;

    // Neither check is atomic with the insert below; concurrent creates may race.
    if book.id > 0 && store.exists(book.id).await.map_err(storage_fault)? {
        return Err(AppError::conflict(
            vec![json!({ "field": "id", "error": "duplicate" })],
            DUPLICATE_ID,
        ));
    }

    if store
        .find_conflict(&book.title, book.id)
        .await
        .map_err(storage_fault)?
        .is_some()
    {
        return Err(AppError::conflict(
            vec![json!({ "field": "title", "error": "duplicate" })],
            DUPLICATE_TITLE,
        ));
    }

    let created = store.insert(&book).await.map_err(storage_fault)?;
    tracing::info!(book_id = created.id, "book created");

    let location = format!("{}/{}", BOOKS_PATH, created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

async fn replace_book(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    ApiJson(book): ApiJson<Book>,
) -> Result<StatusCode, AppError> {
    ensure_positive(id)?;
    validate(&book)?;

    // The body id names the row written; the path id is only re-checked on failure.
    match store.replace(book.id, &book).await {
        Ok(()) => {
            tracing::info!(book_id = book.id, path_id = id, "book replaced");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(StoreError::NotFound) => match store.exists(id).await {
            Ok(false) => Err(AppError::not_found(format!(
                "Resource Not Found: A book with id {id} does not exist to update."
            ))),
            Ok(true) => Err(AppError::database(UPDATE_FAILED)),
            Err(e) => Err(storage_fault(e)),
        },
        Err(e) => Err(storage_fault(e)),
    }
}

async fn delete_book(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    ensure_positive(id)?;

    match store.delete_by_id(id).await {
        Ok(()) => {
            tracing::info!(book_id = id, "book deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(StoreError::NotFound) => Err(AppError::not_found(format!(
            "Resource Not Found: A book with id {id} does not exist to delete."
        ))),
        Err(StoreError::Constraint(reason)) => {
            tracing::warn!(book_id = id, %reason, "delete blocked by constraint");
            Err(AppError::database(DELETE_FAILED))
        }
        Err(e) => Err(storage_fault(e)),
    }
}

fn ensure_positive(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::bad_request(INVALID_ID));
    }
    Ok(())
}

fn validate(book: &Book) -> Result<(), AppError> {
    book.validate().map_err(|errors| {
        let details = errors
            .into_iter()
            .map(|e| json!({ "field": e.field, "error": e.error }))
            .collect();
        AppError::validation(details, INVALID_BODY_MESSAGE)
    })
}

fn storage_fault(err: StoreError) -> AppError {
    AppError::Internal(anyhow::Error::new(err).context("book store operation failed"))
}
