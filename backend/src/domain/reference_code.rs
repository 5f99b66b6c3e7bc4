//! Reference codes identify a donation on the external platform.
//!
//! Codes are `ch-` followed by the 32 hex digits of a fresh v4 UUID. Uniqueness
//! is confirmed against storage through the supplied existence check, and the
//! UNIQUE constraint on the column backs it up.

use std::future::Future;
use tracing::debug;
use uuid::Uuid;

use crate::domain::DonationError;

pub const REFERENCE_CODE_PREFIX: &str = "ch-";
pub const MAX_ATTEMPTS: usize = 16;

pub fn new_candidate() -> String {
    format!("{}{}", REFERENCE_CODE_PREFIX, Uuid::new_v4().simple())
}

/// Draw candidates until `exists` reports one as free.
pub async fn generate_reference_code<F, Fut>(mut exists: F) -> Result<String, DonationError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = new_candidate();
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
        debug!("Reference code {} taken (attempt {})", candidate, attempt);
    }
    Err(DonationError::ReferenceCodeExhausted(MAX_ATTEMPTS))
}
