//! # Domain Layer
//!
//! Business rules of the donation tracker: money handling, the donation
//! lifecycle and its reconciliation against the external ledger. Storage,
//! ledger and rate access go through traits, so everything here runs against
//! test doubles as well as the production adapters.

pub mod commands;
pub mod donation_service;
pub mod donation_validator;
pub mod errors;
pub mod models;
pub mod money;
pub mod reconciliation_sweep;
pub mod reference_code;

pub use commands::{CreateDonationCommand, UpdateDonorDetailsCommand};
pub use donation_service::DonationService;
pub use errors::DonationError;
pub use models::{Charity, Donation, DonationDetails, DonationStatus, Drive};
pub use reconciliation_sweep::{ReconciliationSweep, SweepConfig, SweepReport};
