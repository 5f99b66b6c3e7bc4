//! Shared fixtures for storage and domain tests.
//!
//! Every environment is its own in-memory database seeded with one charity and
//! one drive, so tests never see each other's rows.

use anyhow::Result;
use chrono::{DateTime, Duration, SubsecRound, Utc};

use super::connection::DbConnection;
use super::donation_repository::DonationRepository;
use crate::domain::models::{Charity, Donation, DonationStatus, Drive};
use crate::storage::traits::{CharityStorage, Connection, DriveStorage};

pub struct TestEnvironment {
    pub connection: DbConnection,
    pub charity: Charity,
    pub drive: Drive,
    /// Reference "now", truncated to what storage keeps
    pub now: DateTime<Utc>,
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        let connection = DbConnection::new_in_memory().await?;
        let now = Utc::now().trunc_subsecs(6);

        let charity = Charity {
            id: Charity::generate_id(),
            name: "Cats Protection".to_string(),
            description: Some("Helping cats since 1927".to_string()),
            website_url: Some("https://www.cats.org.uk".to_string()),
            justgiving_charity_id: 2357,
            created_at: now,
        };
        connection
            .create_charity_repository()
            .insert_charity(&charity)
            .await?;

        let drive = Drive {
            id: Drive::generate_id(),
            name: "Spring stream".to_string(),
            source_url: "https://www.youtube.com/watch?v=example".to_string(),
            created_at: now,
        };
        connection.create_drive_repository().insert_drive(&drive).await?;

        Ok(Self {
            connection,
            charity,
            drive,
            now,
        })
    }

    pub fn donation_repository(&self) -> DonationRepository {
        self.connection.create_donation_repository()
    }

    /// An unsaved Pending donation to the seeded charity, created `age` ago
    pub fn pending_donation(&self, reference_code: &str, age: Duration) -> Donation {
        Donation {
            id: Donation::generate_id(),
            reference_code: reference_code.to_string(),
            charity_id: self.charity.id.clone(),
            drive_id: None,
            donor_amount: 1000,
            donor_currency: "USD".to_string(),
            donor_name: None,
            message: None,
            final_amount: None,
            final_currency: None,
            usd_amount: None,
            status: DonationStatus::Pending,
            created_at: self.now - age,
            last_checked: None,
            version: 0,
        }
    }
}
