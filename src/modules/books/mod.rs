pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use library_kernel::{InitCtx, Module, SchemaDef};
use serde_json::json;
use sqlx::SqlitePool;

use models::{AUTHOR_MAX_LEN, DESCRIPTION_MAX_LEN, TITLE_MAX_LEN};
use store::{BookStore, SqliteBookStore, BOOKS_TABLE_DDL};

/// Books module: CRUD over the `books` table
pub struct BooksModule {
    store: Arc<dyn BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn schema(&self) -> Vec<SchemaDef> {
        vec![SchemaDef {
            id: "001_books",
            ddl: BOOKS_TABLE_DDL,
        }]
    }

    /// Fails startup when the `books` table is not readable
    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(ctx.db)
            .await
            .with_context(|| "books table is not readable")?;

        tracing::info!(module = self.name(), books = stored, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn id_parameter(description: &str) -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": description,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn book_request_body() -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "Lists all books.",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Returns a list of books",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("If there is an internal server error")
                    }
                },
                "post": {
                    "summary": "Creates a book.",
                    "tags": ["Books"],
                    "requestBody": book_request_body(),
                    "responses": {
                        "201": book_response("Returns the newly created book"),
                        "400": error_response("If the book fails validation"),
                        "409": error_response("If a book with the same id or title exists"),
                        "500": error_response("If there is an internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Finds a book by id.",
                    "tags": ["Books"],
                    "parameters": [id_parameter("The id of the book to find")],
                    "responses": {
                        "200": book_response("Returns a book"),
                        "400": error_response("If the id is not a positive number"),
                        "404": error_response("If the book is not found"),
                        "500": error_response("If there is an internal server error")
                    }
                },
                "put": {
                    "summary": "Updates a book.",
                    "tags": ["Books"],
                    "parameters": [id_parameter("The id of the book to update")],
                    "requestBody": book_request_body(),
                    "responses": {
                        "204": { "description": "Returns no content" },
                        "400": error_response("If there is a validation error"),
                        "404": error_response("If the book is not found"),
                        "500": error_response("If there is an internal server error")
                    }
                },
                "delete": {
                    "summary": "Deletes a book.",
                    "tags": ["Books"],
                    "parameters": [id_parameter("The id of the book to delete")],
                    "responses": {
                        "204": { "description": "Returns no content" },
                        "400": error_response("If the id is not a positive number"),
                        "404": error_response("If the book is not found"),
                        "500": error_response("If there is an internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "integer",
                            "format": "int64",
                            "description": "Unique identifier, assigned by the server when zero"
                        },
                        "title": {
                            "type": "string",
                            "maxLength": TITLE_MAX_LEN,
                            "description": "Title of the book, unique ignoring case"
                        },
                        "author": {
                            "type": "string",
                            "maxLength": AUTHOR_MAX_LEN,
                            "description": "Author of the book"
                        },
                        "description": {
                            "type": "string",
                            "maxLength": DESCRIPTION_MAX_LEN,
                            "description": "Short description of the book"
                        }
                    },
                    "required": ["title", "author", "description"]
                }
            }
        }
    })
}

/// Create the books module backed by the given pool
pub fn create_module(pool: SqlitePool) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(SqliteBookStore::new(pool))))
}
