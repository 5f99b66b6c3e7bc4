pub mod charity;
pub mod donation;
pub mod drive;

pub use charity::Charity;
pub use donation::{Donation, DonationDetails, DonationStatus};
pub use drive::Drive;
