use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use super::{Charity, Drive};

/// Name shown for donors who left theirs blank
pub const ANONYMOUS_DONOR: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DonationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl DonationStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "Pending",
            DonationStatus::Accepted => "Accepted",
            DonationStatus::Rejected => "Rejected",
        }
    }

    /// Parse a status as stored or as reported by the ledger (case-insensitive)
    pub fn from_external(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(DonationStatus::Pending),
            "accepted" => Some(DonationStatus::Accepted),
            "rejected" => Some(DonationStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DonationStatus::Pending)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A donation pledged through the external platform.
///
/// Amounts are integer minor units. `final_*` and `usd_amount` are only
/// filled in once the ledger reports a settled amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Donation {
    pub id: String,
    pub reference_code: String,
    pub charity_id: String,
    pub drive_id: Option<String>,
    pub donor_amount: i64,
    pub donor_currency: String,
    pub donor_name: Option<String>,
    pub message: Option<String>,
    pub final_amount: Option<i64>,
    pub final_currency: Option<String>,
    pub usd_amount: Option<i64>,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
    pub last_checked: Option<DateTime<Utc>>,
    /// Bumped by every stored update
    pub version: i64,
}

impl Donation {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn is_anonymous(&self) -> bool {
        self.donor_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
    }

    pub fn donor_display_name(&self) -> &str {
        match self.donor_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => ANONYMOUS_DONOR,
        }
    }

    /// True when the donation is still Pending and older than `window`.
    pub fn should_expire(&self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.status != DonationStatus::Pending {
            return false;
        }
        match now.signed_duration_since(self.created_at).to_std() {
            Ok(age) => age > window,
            // created in the future relative to `now`
            Err(_) => false,
        }
    }

    /// Settled amount and currency if known, otherwise what the donor entered
    pub fn display_amount(&self) -> (i64, &str) {
        match (self.final_amount, self.final_currency.as_deref()) {
            (Some(amount), Some(currency)) => (amount, currency),
            _ => (self.donor_amount, &self.donor_currency),
        }
    }
}

/// A donation together with the records it references.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationDetails {
    pub donation: Donation,
    pub charity: Charity,
    pub drive: Option<Drive>,
}
