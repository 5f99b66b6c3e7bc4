//! JustGiving REST adapter.
//!
//! Two concerns live here: looking up a donation's settlement status by the
//! reference code we generated, and building the hosted donate page URL that
//! carries that reference code to the platform in the first place.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use super::client::LedgerClient;
use super::types::{DonationsByReference, LedgerDonation, LedgerError};
use crate::config::JustGivingConfig;
use crate::domain::models::{Charity, Donation};
use crate::domain::money::{format_amount, MoneyError};
use crate::domain::DonationError;

/// HTTP client for the JustGiving API
#[derive(Debug, Clone)]
pub struct JustGivingClient {
    http_client: Client,
    api_url: Url,
    app_id: String,
    link_url: Url,
    exit_base_url: String,
}

impl JustGivingClient {
    pub fn new(config: &JustGivingConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build JustGiving HTTP client")?;

        Ok(Self {
            http_client,
            api_url: base_url(&config.api_url)?,
            app_id: config.app_id.clone(),
            link_url: base_url(&config.link_url)?,
            exit_base_url: config.exit_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the donate page URL a donor is sent to.
    ///
    /// The donor is returned to `{exit_base_url}/donations/check/{reference}`
    /// once the payment flow finishes.
    pub fn donation_link(
        &self,
        donation: &Donation,
        charity: &Charity,
    ) -> Result<String, DonationError> {
        if donation.reference_code.trim().is_empty() {
            return Err(DonationError::MissingReferenceCode);
        }
        if donation.donor_currency.trim().is_empty() {
            return Err(MoneyError::NoCurrencyCode.into());
        }
        if donation.donor_amount == 0 {
            return Err(MoneyError::NoAmount.into());
        }

        let charity_id = charity.justgiving_charity_id.to_string();
        let mut url = with_path(
            &self.link_url,
            &["v1", "charity", "donate", "charityId", &charity_id],
        );
        let exit_url = format!(
            "{}/donations/check/{}",
            self.exit_base_url, donation.reference_code
        );

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("amount", &format_amount(donation.donor_amount))
                .append_pair("currency", &donation.donor_currency)
                .append_pair("reference", &donation.reference_code)
                .append_pair("exitUrl", &exit_url);
            if let Some(message) = donation.message.as_deref().filter(|m| !m.trim().is_empty()) {
                query.append_pair("message", message);
            }
        }

        Ok(url.into())
    }

    fn donation_by_reference_url(&self, reference_code: &str) -> Url {
        with_path(
            &self.api_url,
            &[&self.app_id, "v1", "donation", "ref", reference_code],
        )
    }
}

#[async_trait]
impl LedgerClient for JustGivingClient {
    async fn get_status_by_reference(
        &self,
        reference_code: &str,
    ) -> Result<Option<LedgerDonation>, LedgerError> {
        let url = self.donation_by_reference_url(reference_code);
        debug!("Querying JustGiving for {}", reference_code);

        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(LedgerError::from_request)?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LedgerError::Unauthorized(status.as_u16()))
            }
            s if !s.is_success() => return Err(LedgerError::UnexpectedStatus(s.as_u16())),
            _ => {}
        }

        let body = response.text().await.map_err(LedgerError::from_request)?;
        let payload: DonationsByReference =
            serde_json::from_str(&body).map_err(|e| LedgerError::Malformed(e.to_string()))?;

        Ok(payload.donations.into_iter().next())
    }
}

fn base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid JustGiving URL {}", raw))?;
    if url.cannot_be_a_base() {
        bail!("JustGiving URL {} cannot carry a path", raw);
    }
    Ok(url)
}

/// Append path segments (percent-encoded) to a base URL.
fn with_path(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
