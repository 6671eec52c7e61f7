//! Component B: Persistence Store.
//!
//! Two embedded SQLite stores (spec §4.B): `sessions` (plays, cascade
//! deleted with their session) and `maps` (the indexed map library with
//! per-rate skillset scores). Grounded on rvsrg's `database::connection`
//! (`sqlx::SqlitePool` + `include_str!` migrations replayed idempotently on
//! open) but split into two pools per spec's "two embedded SQL databases".

pub mod criteria;
pub mod maps;
pub mod models;
pub mod sessions;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens a SQLite pool at `path`, creating the file and parent directories
/// if missing, and enabling foreign keys (needed for `ON DELETE CASCADE`)
/// and the shared cache the Maps store wants under concurrent readers
/// (spec §5 "Maps DB ... shared-cache on").
pub(crate) async fn open_pool(path: &std::path::Path, shared_cache: bool) -> Result<sqlx::SqlitePool, StoreError> {
    let is_in_memory = path == std::path::Path::new(":memory:");

    if !is_in_memory
        && let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    let absolute_path = if is_in_memory || path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from(".")).join(path)
    };

    let mut options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(&absolute_path)
        .create_if_missing(true)
        .foreign_keys(true);
    if shared_cache {
        options = options.shared_cache(true);
    }

    let pool = if is_in_memory {
        // A single shared connection so every query in a test sees the same
        // in-memory database instead of each pooled connection getting its
        // own throwaway copy.
        sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?
    } else {
        sqlx::SqlitePool::connect_with(options).await?
    };
    Ok(pool)
}
