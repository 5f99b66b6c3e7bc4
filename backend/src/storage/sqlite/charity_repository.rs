use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::{decode_timestamp, encode_timestamp};
use crate::domain::models::Charity;
use crate::storage::traits::CharityStorage;

#[derive(Debug, Clone)]
pub struct CharityRepository {
    pool: Arc<SqlitePool>,
}

impl CharityRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn row_to_charity(row: &SqliteRow) -> Result<Charity> {
        let created_at: String = row.try_get("created_at")?;
        Ok(Charity {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            website_url: row.try_get("website_url")?,
            justgiving_charity_id: row.try_get("justgiving_charity_id")?,
            created_at: decode_timestamp(&created_at)?,
        })
    }
}

#[async_trait]
impl CharityStorage for CharityRepository {
    async fn find_charity(&self, id: &str) -> Result<Option<Charity>> {
        let row = sqlx::query(
            "SELECT id, name, description, website_url, justgiving_charity_id, created_at \
             FROM charities WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .with_context(|| format!("failed to load charity {}", id))?;

        row.as_ref().map(Self::row_to_charity).transpose()
    }

    async fn insert_charity(&self, charity: &Charity) -> Result<()> {
        sqlx::query(
            "INSERT INTO charities (id, name, description, website_url, justgiving_charity_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&charity.id)
        .bind(&charity.name)
        .bind(&charity.description)
        .bind(&charity.website_url)
        .bind(charity.justgiving_charity_id)
        .bind(encode_timestamp(&charity.created_at))
        .execute(&*self.pool)
        .await
        .with_context(|| format!("failed to insert charity {}", charity.id))?;
        Ok(())
    }
}
