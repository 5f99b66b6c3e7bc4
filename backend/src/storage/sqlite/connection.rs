use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

use super::{CharityRepository, DonationRepository, DriveRepository};
use crate::storage::traits::Connection;

/// DbConnection owns the SQLite pool shared by all repositories
#[derive(Debug, Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url` and set up the schema
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url)
                .await
                .with_context(|| format!("failed to create database {}", url))?;
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// A private in-memory database.
    ///
    /// The pool holds exactly one connection that never expires, since every
    /// SQLite in-memory connection is its own database.
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS charities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                website_url TEXT,
                justgiving_charity_id INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("failed to create charities table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS drives (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                source_url TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("failed to create drives table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS donations (
                id TEXT PRIMARY KEY,
                reference_code TEXT NOT NULL UNIQUE CHECK (reference_code <> ''),
                charity_id TEXT NOT NULL REFERENCES charities (id),
                drive_id TEXT,
                donor_amount INTEGER NOT NULL CHECK (donor_amount >= 0),
                donor_currency TEXT NOT NULL,
                donor_name TEXT,
                message TEXT,
                final_amount INTEGER,
                final_currency TEXT,
                usd_amount INTEGER,
                status TEXT NOT NULL CHECK (status IN ('Pending', 'Accepted', 'Rejected')),
                created_at TEXT NOT NULL,
                last_checked TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(pool)
        .await
        .context("failed to create donations table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_donations_next_check \
             ON donations (status, COALESCE(last_checked, created_at))",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_donations_status_created \
             ON donations (status, created_at)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn shared_pool(&self) -> Arc<SqlitePool> {
        self.pool.clone()
    }
}

impl Connection for DbConnection {
    type DonationRepository = DonationRepository;
    type CharityRepository = CharityRepository;
    type DriveRepository = DriveRepository;

    fn create_donation_repository(&self) -> DonationRepository {
        DonationRepository::new(self.shared_pool())
    }

    fn create_charity_repository(&self) -> CharityRepository {
        CharityRepository::new(self.shared_pool())
    }

    fn create_drive_repository(&self) -> DriveRepository {
        DriveRepository::new(self.shared_pool())
    }
}
