//! Conversions between domain models and the `shared` view types.

pub mod mappers;

pub use mappers::DonationMapper;
