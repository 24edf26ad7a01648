use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshot {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // Every in-memory connection is its own database, so keep exactly one alive.
        let pool_options = if database_url.starts_with(MEMORY_DATABASE_URL) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn put_snapshot(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_snapshots (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write snapshot '{key}'"))?;
        Ok(())
    }

    pub async fn get_snapshot(&self, key: &str) -> Result<Option<StoredSnapshot>> {
        let row = sqlx::query("SELECT key, value, updated_at FROM kv_snapshots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read snapshot '{key}'"))?;

        row.map(|row| {
            Ok(StoredSnapshot {
                key: row.try_get("key")?,
                value: row.try_get("value")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    /// Returns whether a row was removed.
    pub async fn delete_snapshot(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_snapshots WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete snapshot '{key}'"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_snapshot_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv_snapshots ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .context("failed to list snapshot keys")?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>("key").map_err(Into::into))
            .collect()
    }
}

pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

pub fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_DATABASE_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
