use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::{decode_timestamp, encode_timestamp};
use crate::domain::models::{Donation, DonationStatus};
use crate::storage::traits::DonationStorage;

const DONATION_COLUMNS: &str = "id, reference_code, charity_id, drive_id, donor_amount, \
     donor_currency, donor_name, message, final_amount, final_currency, usd_amount, status, \
     created_at, last_checked, version";

#[derive(Debug, Clone)]
pub struct DonationRepository {
    pool: Arc<SqlitePool>,
}

impl DonationRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn row_to_donation(row: &SqliteRow) -> Result<Donation> {
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;
        let last_checked: Option<String> = row.try_get("last_checked")?;

        Ok(Donation {
            id: row.try_get("id")?,
            reference_code: row.try_get("reference_code")?,
            charity_id: row.try_get("charity_id")?,
            drive_id: row.try_get("drive_id")?,
            donor_amount: row.try_get("donor_amount")?,
            donor_currency: row.try_get("donor_currency")?,
            donor_name: row.try_get("donor_name")?,
            message: row.try_get("message")?,
            final_amount: row.try_get("final_amount")?,
            final_currency: row.try_get("final_currency")?,
            usd_amount: row.try_get("usd_amount")?,
            status: DonationStatus::from_external(&status)
                .ok_or_else(|| anyhow!("invalid stored donation status {:?}", status))?,
            created_at: decode_timestamp(&created_at)?,
            last_checked: last_checked.as_deref().map(decode_timestamp).transpose()?,
            version: row.try_get("version")?,
        })
    }

    fn rows_to_donations(rows: &[SqliteRow]) -> Result<Vec<Donation>> {
        rows.iter().map(Self::row_to_donation).collect()
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Donation>> {
        let sql = format!("SELECT {} FROM donations WHERE {} = ?", DONATION_COLUMNS, column);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&*self.pool)
            .await
            .with_context(|| format!("failed to load donation by {}", column))?;

        row.as_ref().map(Self::row_to_donation).transpose()
    }
}

#[async_trait]
impl DonationStorage for DonationRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Donation>> {
        self.find_one("id", id).await
    }

    async fn find_by_reference_code(&self, reference_code: &str) -> Result<Option<Donation>> {
        self.find_one("reference_code", reference_code).await
    }

    async fn reference_code_exists(&self, reference_code: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM donations WHERE reference_code = ?")
            .bind(reference_code)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, donation: &Donation) -> Result<String> {
        let sql = format!(
            "INSERT INTO donations ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
            DONATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&donation.id)
            .bind(&donation.reference_code)
            .bind(&donation.charity_id)
            .bind(&donation.drive_id)
            .bind(donation.donor_amount)
            .bind(&donation.donor_currency)
            .bind(&donation.donor_name)
            .bind(&donation.message)
            .bind(donation.final_amount)
            .bind(&donation.final_currency)
            .bind(donation.usd_amount)
            .bind(donation.status.as_str())
            .bind(encode_timestamp(&donation.created_at))
            .bind(donation.last_checked.as_ref().map(encode_timestamp))
            .bind(donation.version)
            .fetch_one(&*self.pool)
            .await
            .with_context(|| format!("failed to insert donation {}", donation.reference_code))?;

        Ok(row.try_get("id")?)
    }

    async fn update(&self, donation: &Donation) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE donations
            SET drive_id = ?, donor_name = ?, message = ?, final_amount = ?,
                final_currency = ?, usd_amount = ?, status = ?, last_checked = ?,
                version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&donation.drive_id)
        .bind(&donation.donor_name)
        .bind(&donation.message)
        .bind(donation.final_amount)
        .bind(&donation.final_currency)
        .bind(donation.usd_amount)
        .bind(donation.status.as_str())
        .bind(donation.last_checked.as_ref().map(encode_timestamp))
        .bind(&donation.id)
        .bind(donation.version)
        .execute(&*self.pool)
        .await
        .with_context(|| format!("failed to update donation {}", donation.id))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_pending_due_for_check(
        &self,
        checked_before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Donation>> {
        let sql = format!(
            r#"
            SELECT {} FROM donations
            WHERE status = 'Pending' AND (last_checked IS NULL OR last_checked <= ?)
            ORDER BY last_checked IS NOT NULL, COALESCE(last_checked, created_at) ASC
            LIMIT ?
            "#,
            DONATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(encode_timestamp(&checked_before))
            .bind(limit)
            .fetch_all(&*self.pool)
            .await
            .context("failed to select donations due for a check")?;

        Self::rows_to_donations(&rows)
    }

    async fn list_recent_accepted(&self, limit: u32) -> Result<Vec<Donation>> {
        let sql = format!(
            "SELECT {} FROM donations WHERE status = 'Accepted' ORDER BY created_at DESC LIMIT ?",
            DONATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&*self.pool)
            .await
            .context("failed to list recent donations")?;

        Self::rows_to_donations(&rows)
    }
}
