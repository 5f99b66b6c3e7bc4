//! # Storage Traits
//!
//! Storage abstractions used by the domain layer. Lookups return
//! `Ok(None)` for absence so that "not there" is never confused with a
//! failed query.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::{Charity, Donation, Drive};

/// Trait defining the interface for donation storage operations
#[async_trait]
pub trait DonationStorage: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Donation>>;

    async fn find_by_reference_code(&self, reference_code: &str) -> Result<Option<Donation>>;

    async fn reference_code_exists(&self, reference_code: &str) -> Result<bool>;

    /// Store a new donation and return the id it was stored under
    async fn insert(&self, donation: &Donation) -> Result<String>;

    /// Write the mutable fields of a donation if its stored `version` still
    /// matches `donation.version`, bumping the stored version.
    ///
    /// Returns false when the version did not match (or the row is gone).
    async fn update(&self, donation: &Donation) -> Result<bool>;

    /// Pending donations that were never checked, or last checked at or
    /// before `checked_before`. Never-checked donations come first (oldest
    /// first), then the longest-unchecked ones.
    async fn find_pending_due_for_check(
        &self,
        checked_before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Donation>>;

    /// Accepted donations, newest first
    async fn list_recent_accepted(&self, limit: u32) -> Result<Vec<Donation>>;
}

/// Trait defining the interface for charity storage operations
#[async_trait]
pub trait CharityStorage: Send + Sync {
    async fn find_charity(&self, id: &str) -> Result<Option<Charity>>;

    async fn insert_charity(&self, charity: &Charity) -> Result<()>;
}

/// Trait defining the interface for drive storage operations
#[async_trait]
pub trait DriveStorage: Send + Sync {
    async fn find_drive(&self, id: &str) -> Result<Option<Drive>>;

    /// Fetch every drive whose id is in `ids`; unknown ids are skipped
    async fn find_drives(&self, ids: &[String]) -> Result<Vec<Drive>>;

    async fn insert_drive(&self, drive: &Drive) -> Result<()>;
}

/// Factory for the repositories of one storage backend.
pub trait Connection: Send + Sync + Clone + 'static {
    type DonationRepository: DonationStorage;
    type CharityRepository: CharityStorage;
    type DriveRepository: DriveStorage;

    fn create_donation_repository(&self) -> Self::DonationRepository;

    fn create_charity_repository(&self) -> Self::CharityRepository;

    fn create_drive_repository(&self) -> Self::DriveRepository;
}
