//! SQLite-backed failed queue
//!
//! Facilities that could not be reconciled are appended here; a separate
//! retry worker drains the table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::services::{FailedQueue, FailedQueueEntry};

/// A row of the failed queue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedFacility {
    pub id: i64,
    pub facility_id: String,
    pub reason: String,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SqliteFailedQueue {
    pool: SqlitePool,
}

impl SqliteFailedQueue {
    /// Open (creating if needed) the queue database at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create queue directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open queue database: {}", path.display()))?;

        Self::from_pool(pool).await
    }

    /// Connect using a sqlx URL such as `sqlite::memory:`
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .with_context(|| format!("Failed to connect to queue database: {}", url))?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS failed_facilities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                facility_id TEXT NOT NULL,
                reason TEXT NOT NULL,
                enqueued_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("Failed to create failed_facilities table")?;

        Ok(Self { pool })
    }

    /// All queued facilities, oldest first
    pub async fn list(&self) -> Result<Vec<QueuedFacility>> {
        let rows = sqlx::query(
            "SELECT id, facility_id, reason, enqueued_at FROM failed_facilities ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list failed queue")?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(QueuedFacility {
                id: row.try_get("id")?,
                facility_id: row.try_get("facility_id")?,
                reason: row.try_get("reason")?,
                enqueued_at: row.try_get("enqueued_at")?,
            });
        }

        Ok(entries)
    }

    pub async fn len(&self) -> Result<usize> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM failed_facilities")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count failed queue")?
            .try_get("count")?;
        Ok(count as usize)
    }

    /// Remove every entry, returning how many were dropped
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM failed_facilities")
            .execute(&self.pool)
            .await
            .context("Failed to clear failed queue")?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FailedQueue for SqliteFailedQueue {
    async fn enqueue(&self, entry: FailedQueueEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO failed_facilities (facility_id, reason, enqueued_at) VALUES (?, ?, ?)",
        )
        .bind(&entry.facility_id)
        .bind(&entry.reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to enqueue facility {}", entry.facility_id))?;

        Ok(())
    }
}
