use chrono::SecondsFormat;
use shared::{CharityView, DonationStatus, DonationView, DriveView};

use crate::domain::models::{
    Charity, DonationDetails, DonationStatus as DomainDonationStatus, Drive,
};
use crate::domain::money::format_amount;

pub struct DonationMapper;

impl DonationMapper {
    pub fn status_to_dto(status: DomainDonationStatus) -> DonationStatus {
        match status {
            DomainDonationStatus::Pending => DonationStatus::Pending,
            DomainDonationStatus::Accepted => DonationStatus::Accepted,
            DomainDonationStatus::Rejected => DonationStatus::Rejected,
        }
    }

    pub fn charity_to_dto(charity: &Charity) -> CharityView {
        CharityView {
            id: charity.id.clone(),
            name: charity.name.clone(),
            description: charity.description.clone(),
            website_url: charity.website_url.clone(),
        }
    }

    pub fn drive_to_dto(drive: &Drive) -> DriveView {
        DriveView {
            id: drive.id.clone(),
            name: drive.name.clone(),
            source_url: drive.source_url.clone(),
        }
    }

    /// Render a donation for feeds and the confirmation page
    pub fn to_dto(details: &DonationDetails) -> DonationView {
        let donation = &details.donation;
        let (amount, currency) = donation.display_amount();

        DonationView {
            reference_code: donation.reference_code.clone(),
            status: Self::status_to_dto(donation.status),
            donor_name: donation.donor_display_name().to_string(),
            message: donation.message.clone(),
            amount: format_amount(amount),
            currency: currency.to_string(),
            usd_amount: donation.usd_amount.map(format_amount),
            charity: Self::charity_to_dto(&details.charity),
            drive: details.drive.as_ref().map(Self::drive_to_dto),
            created_at: donation
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
