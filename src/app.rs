//! Process bootstrap shared by the `library-app` binary and the CLI.

use anyhow::Context;
use library_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules;

/// Registry holding every application module, bound to `pool`
pub fn build_registry(pool: &SqlitePool) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, pool);
    registry
}

/// Connect to the configured database and create missing tables.
pub async fn init_database(settings: &Settings) -> anyhow::Result<SqlitePool> {
    let pool = library_db::connect(&settings.database).await?;
    let registry = build_registry(&pool);

    library_db::ensure_schema(&pool, &registry.collect_schema())
        .await
        .with_context(|| "failed to ensure database schema")?;

    Ok(pool)
}

/// Run the HTTP service until Ctrl-C.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let pool = library_db::connect(&settings.database).await?;
    let registry = build_registry(&pool);
    let ctx = InitCtx {
        settings: &settings,
        db: &pool,
    };

    registry.init_all(&ctx).await?;
    library_db::ensure_schema(&pool, &registry.collect_schema())
        .await
        .with_context(|| "failed to ensure database schema")?;
    registry.start_all(&ctx).await?;

    tracing::info!("library-app bootstrap complete");

    let served = library_http::start_server(&registry, &settings, pool.clone(), shutdown_signal()).await;

    registry.stop_all().await?;
    pool.close().await;
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::{header, Method, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let pool = library_db::connect_in_memory().await.unwrap();
        let registry = build_registry(&pool);
        library_db::ensure_schema(&pool, &registry.collect_schema())
            .await
            .unwrap();
        library_http::build_router(&registry, &Settings::default(), pool)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, location, body)
    }

    #[tokio::test]
    async fn registry_contains_books_module() {
        let pool = SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let registry = build_registry(&pool);

        assert!(registry.get_module("books").is_some());
        assert_eq!(registry.collect_schema().len(), 1);
    }

    #[tokio::test]
    async fn book_lifecycle_through_the_full_stack() {
        let app = app().await;

        let (status, location, created) = call(
            &app,
            Method::POST,
            "/api/books",
            Some(json!({ "title": "Dune", "author": "Herbert", "description": "Desert planet saga" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        let location = location.unwrap();
        assert_eq!(location, "/api/books/1");

        let (status, _, fetched) = call(&app, Method::GET, &location, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, _, body) = call(
            &app,
            Method::PUT,
            "/api/books/1",
            Some(json!({ "id": 1, "title": "Dune (Updated)", "author": "Herbert", "description": "Revised" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (_, _, fetched) = call(&app, Method::GET, "/api/books/1", None).await;
        assert_eq!(fetched["title"], "Dune (Updated)");
        assert_eq!(fetched["description"], "Revised");

        let (status, _, _) = call(&app, Method::DELETE, "/api/books/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, body) = call(&app, Method::GET, "/api/books/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"]["message"],
            "Resource Not Found: A book with id 1 does not exist."
        );

        let (status, _, listed) = call(&app, Method::GET, "/api/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn openapi_documents_books_routes() {
        let app = app().await;

        let (status, _, spec) = call(&app, Method::GET, "/docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(spec["paths"]["/api/books"]["post"].is_object());
        assert!(spec["paths"]["/api/books/{id}"]["delete"].is_object());
    }
}
