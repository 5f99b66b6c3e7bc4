use serde::{Deserialize, Deserializer};

/// A donation as reported by the external ledger.
///
/// Amount and currency are only present once the platform has settled the
/// payment. The amount stays in its decimal string form; the domain parses it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDonation {
    pub status: String,
    #[serde(default, deserialize_with = "decimal_text")]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub third_party_reference: Option<String>,
}

impl LedgerDonation {
    /// A settled record with amount and currency.
    pub fn settled(status: &str, amount: &str, currency_code: &str) -> Self {
        Self {
            status: status.to_string(),
            amount: Some(amount.to_string()),
            currency_code: Some(currency_code.to_string()),
            third_party_reference: None,
        }
    }

    /// A record carrying only a status.
    pub fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            amount: None,
            currency_code: None,
            third_party_reference: None,
        }
    }
}

/// Body of `GET /{appId}/v1/donation/ref/{reference}`
#[derive(Debug, Deserialize)]
pub(crate) struct DonationsByReference {
    #[serde(default)]
    pub donations: Vec<LedgerDonation>,
}

/// JustGiving sends amounts as strings but older endpoints use JSON numbers.
fn decimal_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Amount>::deserialize(deserializer)?.map(|amount| match amount {
        Amount::Text(text) => text,
        Amount::Number(number) => number.to_string(),
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ledger request timed out")]
    Timeout,
    #[error("ledger refused our credentials (HTTP {0})")]
    Unauthorized(u16),
    #[error("unexpected ledger response status: {0}")]
    UnexpectedStatus(u16),
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

impl LedgerError {
    /// Classify a reqwest failure, keeping timeouts distinct.
    pub fn from_request(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            LedgerError::Timeout
        } else {
            LedgerError::Http(error)
        }
    }

    /// Whether the same request may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Http(_) | LedgerError::Timeout => true,
            LedgerError::UnexpectedStatus(status) => *status == 429 || *status >= 500,
            LedgerError::Unauthorized(_) | LedgerError::Malformed(_) => false,
        }
    }
}
