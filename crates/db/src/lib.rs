//! SQLite pool factory and schema bootstrap for the library service.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use library_kernel::settings::DatabaseSettings;
use library_kernel::SchemaDef;

/// Open a connection pool for the configured database, creating the file if missing.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
        .connect_with(options)
        .await
        .with_context(|| "failed to connect to database")?;

    tracing::info!(
        target: "library-db",
        max_connections = settings.max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Single-connection in-memory database, used by tests.
///
/// Every connection to `sqlite::memory:` is a separate database, so the pool
/// is pinned to one connection that never expires.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .with_context(|| "failed to open in-memory database")
}

/// Execute each module's DDL in the given order.
pub async fn ensure_schema(
    pool: &SqlitePool,
    statements: &[(String, SchemaDef)],
) -> anyhow::Result<()> {
    for (module, def) in statements {
        tracing::info!(target: "library-db", module = %module, schema = def.id, "ensuring schema");

        sqlx::raw_sql(def.ddl)
            .execute(pool)
            .await
            .with_context(|| format!("failed to apply schema '{}' of module '{}'", def.id, module))?;
    }

    Ok(())
}

/// Round-trip a trivial query to check the database is reachable.
pub async fn ping(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
