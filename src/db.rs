use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::path::Path;

/// MIGRATOR
///
/// The embedded migrations under `migrations/`. Creates the `users` table.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// connect
///
/// Opens (creating if needed) the SQLite file at `path`. Missing parent directories
/// are created first so a fresh checkout can start without any setup.
pub async fn connect(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    tracing::debug!(path = %path.display(), "Opening SQLite store");
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// connect_in_memory
///
/// A private in-memory database for tests. It is pinned to a single connection that
/// never expires, since each new in-memory connection would see an empty database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new().in_memory(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}
