use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement status of a donation as shown to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationStatus {
    /// Waiting for the fundraising platform to confirm the payment
    Pending,
    /// The platform confirmed the payment
    Accepted,
    /// The platform refused the payment or never saw it
    Rejected,
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DonationStatus::Pending => "Pending",
            DonationStatus::Accepted => "Accepted",
            DonationStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

/// Read-only charity projection attached to a donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharityView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
}

/// Read-only drive projection attached to a donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveView {
    pub id: String,
    pub name: String,
    pub source_url: String,
}

/// A donation as rendered in feeds and on the confirmation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationView {
    /// Externally visible reference code
    pub reference_code: String,
    pub status: DonationStatus,
    /// Donor display name, "Anonymous" when the donor left it blank
    pub donor_name: String,
    pub message: Option<String>,
    /// Settled amount when known, otherwise what the donor entered ("12.34")
    pub amount: String,
    /// Currency matching `amount`
    pub currency: String,
    /// Settled amount converted to USD, if the conversion succeeded
    pub usd_amount: Option<String>,
    pub charity: CharityView,
    pub drive: Option<DriveView>,
    /// Creation time (RFC 3339)
    pub created_at: String,
}
