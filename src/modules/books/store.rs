//! Persistence for books.

use async_trait::async_trait;
use sqlx::{error::ErrorKind, SqlitePool};
use thiserror::Error;

use super::models::Book;

pub const BOOKS_TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 150),
        author      TEXT NOT NULL CHECK (length(author) BETWEEN 1 AND 100),
        description TEXT NOT NULL CHECK (length(description) BETWEEN 1 AND 250)
    );
"#;

/// Outcome of a failed store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("book not found")]
    NotFound,

    /// NOT NULL, CHECK, UNIQUE or FOREIGN KEY rejection
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("storage failure: {0}")]
    Storage(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ) {
                return StoreError::Constraint(db_err.message().to_string());
            }
        }
        StoreError::Storage(err)
    }
}

/// Durable storage of books.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every stored book, in storage order
    async fn list_all(&self) -> Result<Vec<Book>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError>;

    async fn exists(&self, id: i64) -> Result<bool, StoreError>;

    /// First book whose title matches case-insensitively or whose id equals `id`
    async fn find_conflict(&self, title: &str, id: i64) -> Result<Option<Book>, StoreError>;

    /// Persist a new book. A positive `book.id` is used as the row id,
    /// otherwise the database assigns one.
    async fn insert(&self, book: &Book) -> Result<Book, StoreError>;

    /// Overwrite every field of book `id`. `NotFound` when no row was affected.
    async fn replace(&self, id: i64, book: &Book) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;
}

/// `BookStore` backed by the `books` table.
#[derive(Debug, Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        let books = sqlx::query_as::<_, Book>("SELECT id, title, author, description FROM books")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, description FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found != 0)
    }

    async fn find_conflict(&self, title: &str, id: i64) -> Result<Option<Book>, StoreError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, description FROM books \
             WHERE lower(title) = lower(?) OR id = ? LIMIT 1",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn insert(&self, book: &Book) -> Result<Book, StoreError> {
        let query = if book.id > 0 {
            sqlx::query_as::<_, Book>(
                "INSERT INTO books (id, title, author, description) VALUES (?, ?, ?, ?) \
                 RETURNING id, title, author, description",
            )
            .bind(book.id)
        } else {
            sqlx::query_as::<_, Book>(
                "INSERT INTO books (title, author, description) VALUES (?, ?, ?) \
                 RETURNING id, title, author, description",
            )
        };

        let created = query
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.description)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn replace(&self, id: i64, book: &Book) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE books SET title = ?, author = ?, description = ? WHERE id = ?")
                .bind(&book.title)
                .bind(&book.author)
                .bind(&book.description)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
