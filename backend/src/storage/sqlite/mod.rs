//! # SQLite Storage Module
//!
//! sqlx-backed implementation of the storage traits. Timestamps are stored as
//! fixed-width RFC 3339 text (UTC, microseconds) so they sort lexically.

pub mod charity_repository;
pub mod connection;
pub mod donation_repository;
pub mod drive_repository;

#[cfg(test)]
pub mod test_utils;

pub use charity_repository::CharityRepository;
pub use connection::DbConnection;
pub use donation_repository::DonationRepository;
pub use drive_repository::DriveRepository;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

pub(crate) fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .with_context(|| format!("invalid stored timestamp {:?}", raw))
}
