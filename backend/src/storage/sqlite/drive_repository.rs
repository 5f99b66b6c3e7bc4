use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::{decode_timestamp, encode_timestamp};
use crate::domain::models::Drive;
use crate::storage::traits::DriveStorage;

#[derive(Debug, Clone)]
pub struct DriveRepository {
    pool: Arc<SqlitePool>,
}

impl DriveRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn row_to_drive(row: &SqliteRow) -> Result<Drive> {
        let created_at: String = row.try_get("created_at")?;
        Ok(Drive {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            source_url: row.try_get("source_url")?,
            created_at: decode_timestamp(&created_at)?,
        })
    }
}

#[async_trait]
impl DriveStorage for DriveRepository {
    async fn find_drive(&self, id: &str) -> Result<Option<Drive>> {
        let row = sqlx::query("SELECT id, name, source_url, created_at FROM drives WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .with_context(|| format!("failed to load drive {}", id))?;

        row.as_ref().map(Self::row_to_drive).transpose()
    }

    async fn find_drives(&self, ids: &[String]) -> Result<Vec<Drive>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, source_url, created_at FROM drives WHERE id IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&*self.pool)
            .await
            .context("failed to load drives")?;
        rows.iter().map(Self::row_to_drive).collect()
    }

    async fn insert_drive(&self, drive: &Drive) -> Result<()> {
        sqlx::query("INSERT INTO drives (id, name, source_url, created_at) VALUES (?, ?, ?, ?)")
            .bind(&drive.id)
            .bind(&drive.name)
            .bind(&drive.source_url)
            .bind(encode_timestamp(&drive.created_at))
            .execute(&*self.pool)
            .await
            .with_context(|| format!("failed to insert drive {}", drive.id))?;
        Ok(())
    }
}
