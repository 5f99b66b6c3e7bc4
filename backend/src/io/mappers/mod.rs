pub mod donation_mapper;

pub use donation_mapper::DonationMapper;
