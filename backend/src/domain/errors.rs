use crate::domain::models::DonationStatus;
use crate::domain::money::MoneyError;
use crate::ledger::LedgerError;

/// Everything the donation lifecycle can fail with.
///
/// Validation and precondition errors are final. Storage, ledger and
/// concurrency errors may clear up on a later attempt.
#[derive(Debug, thiserror::Error)]
pub enum DonationError {
    #[error(transparent)]
    Money(#[from] MoneyError),
    #[error("donation has no charity")]
    NoCharity,
    #[error("charity {0} not found")]
    CharityNotFound(String),
    #[error("donation already has a reference code")]
    AlreadyInserted,
    #[error("donation has no reference code")]
    MissingReferenceCode,
    #[error("donation {reference_code} is already {status}")]
    NotPending {
        reference_code: String,
        status: DonationStatus,
    },
    #[error("donation {0} not found")]
    DonationNotFound(String),
    #[error("drive {0} not found")]
    DriveNotFound(String),
    #[error("no free reference code after {0} attempts")]
    ReferenceCodeExhausted(usize),
    #[error("donation {0} was modified concurrently")]
    ConcurrentModification(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl DonationError {
    /// Whether retrying the same operation later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            DonationError::Ledger(e) => e.is_transient(),
            DonationError::Storage(_) | DonationError::ConcurrentModification(_) => true,
            _ => false,
        }
    }
}
