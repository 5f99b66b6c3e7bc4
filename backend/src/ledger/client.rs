use async_trait::async_trait;

use super::types::{LedgerDonation, LedgerError};

/// Read access to the external ledger.
///
/// `Ok(None)` is the authoritative "the ledger has never heard of this
/// reference" answer. Every failure to get an answer, timeouts included, is an
/// `Err` and must never be read as absence.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Look up a donation by the reference code we handed to the platform
    async fn get_status_by_reference(
        &self,
        reference_code: &str,
    ) -> Result<Option<LedgerDonation>, LedgerError>;
}
