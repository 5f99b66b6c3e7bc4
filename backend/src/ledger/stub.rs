//! Scripted ledger for lifecycle and sweep tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::client::LedgerClient;
use super::types::{LedgerDonation, LedgerError};

/// What the stub answers for one reference code
#[derive(Debug, Clone)]
pub enum StubResponse {
    Found(LedgerDonation),
    NotFound,
    /// Fails with a transient `UnexpectedStatus(503)`
    Unavailable,
    Unauthorized,
    /// Sleeps before answering "not found"
    Slow(Duration),
}

/// In-memory `LedgerClient`; unknown references are reported as not found.
#[derive(Debug, Default)]
pub struct StubLedger {
    responses: Mutex<HashMap<String, StubResponse>>,
    calls: Mutex<Vec<String>>,
}

impl StubLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, reference_code: &str, response: StubResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(reference_code.to_string(), response);
    }

    /// Reference codes queried so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for StubLedger {
    async fn get_status_by_reference(
        &self,
        reference_code: &str,
    ) -> Result<Option<LedgerDonation>, LedgerError> {
        self.calls.lock().unwrap().push(reference_code.to_string());
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(reference_code)
            .cloned()
            .unwrap_or(StubResponse::NotFound);

        match response {
            StubResponse::Found(donation) => Ok(Some(donation)),
            StubResponse::NotFound => Ok(None),
            StubResponse::Unavailable => Err(LedgerError::UnexpectedStatus(503)),
            StubResponse::Unauthorized => Err(LedgerError::Unauthorized(401)),
            StubResponse::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(None)
            }
        }
    }
}
