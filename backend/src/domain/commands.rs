//! Inputs to the donation service.

/// Pledge a new donation.
///
/// `reference_code` must be left empty: codes are only ever assigned by the
/// service. A value here means the donation was already inserted.
#[derive(Debug, Clone, Default)]
pub struct CreateDonationCommand {
    pub charity_id: Option<String>,
    pub drive_id: Option<String>,
    /// Minor units
    pub donor_amount: i64,
    pub donor_currency: String,
    pub donor_name: Option<String>,
    pub message: Option<String>,
    pub reference_code: Option<String>,
}

/// Administrative edit of the donor-supplied free text.
#[derive(Debug, Clone)]
pub struct UpdateDonorDetailsCommand {
    pub donation_id: String,
    pub donor_name: Option<String>,
    pub message: Option<String>,
}
