//! # Rate Source
//!
//! Converts settled donation amounts into USD for reporting. The domain only
//! depends on the [`RateSource`] trait; the shipped implementation is a static
//! table read from configuration.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    #[error("no exchange rate for {0}")]
    UnknownCurrency(String),
    #[error("converting {amount} {currency} overflowed")]
    Overflow { amount: i64, currency: String },
}

/// Trait for anything able to price an amount in USD.
///
/// Shared process-wide and read-only from the domain's point of view.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Convert `amount` minor units of `from_currency` into USD minor units
    async fn convert(&self, amount: i64, from_currency: &str) -> Result<i64, RateError>;
}

/// Fixed USD rates keyed by uppercase currency code.
#[derive(Debug, Clone, Default)]
pub struct StaticRateTable {
    usd_per_unit: HashMap<String, Decimal>,
}

impl StaticRateTable {
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        let usd_per_unit = rates
            .into_iter()
            .map(|(code, rate)| (code.trim().to_ascii_uppercase(), rate))
            .collect();
        Self { usd_per_unit }
    }
}

#[async_trait]
impl RateSource for StaticRateTable {
    async fn convert(&self, amount: i64, from_currency: &str) -> Result<i64, RateError> {
        let rate = self
            .usd_per_unit
            .get(&from_currency.to_ascii_uppercase())
            .ok_or_else(|| RateError::UnknownCurrency(from_currency.to_string()))?;

        Decimal::from(amount)
            .checked_mul(*rate)
            .map(|usd| usd.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|usd| usd.to_i64())
            .ok_or_else(|| RateError::Overflow {
                amount,
                currency: from_currency.to_string(),
            })
    }
}
