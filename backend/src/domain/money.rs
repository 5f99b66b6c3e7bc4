//! Money and currency rules.
//!
//! Amounts are carried as integer minor units (cents) everywhere outside this
//! module. Decimal strings coming from donors or from the JustGiving API are
//! parsed with exact decimal arithmetic, never through floats.

use iso_currency::Currency;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::warn;

use crate::rates::{RateError, RateSource};

/// Currency every donation is reported in.
pub const REPORTING_CURRENCY: &str = "USD";

/// Currencies donors may pick. All of them have two minor digits.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "GBP", "USD", "EUR", "CAD", "AUD", "NZD", "HKD", "SGD", "ZAR", "CHF", "SEK", "NOK", "DKK",
    "AED",
];

const MINOR_DIGITS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("no currency code")]
    NoCurrencyCode,
    #[error("no donation amount")]
    NoAmount,
    #[error("invalid donation amount {0:?}")]
    InvalidAmount(String),
    #[error("donation amount can't be negative")]
    NegativeAmount,
    #[error("unsupported currency {0:?}")]
    UnsupportedCurrency(String),
}

/// Parse a decimal amount ("12.34") into minor units (1234).
///
/// Extra decimals are rounded half away from zero.
pub fn parse_amount(raw: &str) -> Result<i64, MoneyError> {
    let trimmed = raw.trim();
    let value =
        Decimal::from_str(trimmed).map_err(|_| MoneyError::InvalidAmount(raw.to_string()))?;
    let rounded = value.round_dp_with_strategy(MINOR_DIGITS, RoundingStrategy::MidpointAwayFromZero);

    if rounded < Decimal::ZERO {
        return Err(MoneyError::NegativeAmount);
    }

    rounded
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| MoneyError::InvalidAmount(raw.to_string()))
}

/// Render minor units as a two-decimal string (7500 -> "75.00").
pub fn format_amount(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Validate a donor-selected currency and return its canonical uppercase code.
pub fn normalize_currency(code: &str) -> Result<String, MoneyError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::NoCurrencyCode);
    }

    let upper = trimmed.to_ascii_uppercase();
    match Currency::from_code(&upper) {
        Some(currency) if SUPPORTED_CURRENCIES.contains(&currency.code()) => {
            Ok(currency.code().to_string())
        }
        _ => Err(MoneyError::UnsupportedCurrency(trimmed.to_string())),
    }
}

/// Recognize any ISO-4217 code. Used for currencies reported by the ledger,
/// which are not limited to the donor-facing set.
pub fn canonical_currency(code: &str) -> Result<String, MoneyError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::NoCurrencyCode);
    }

    Currency::from_code(&trimmed.to_ascii_uppercase())
        .map(|currency| currency.code().to_string())
        .ok_or_else(|| MoneyError::UnsupportedCurrency(trimmed.to_string()))
}

/// Convert an amount into the reporting currency.
pub async fn convert_to_reporting_currency(
    rates: &dyn RateSource,
    amount: i64,
    currency: &str,
) -> Result<i64, RateError> {
    if currency == REPORTING_CURRENCY {
        return Ok(amount);
    }
    rates.convert(amount, currency).await
}

/// Best-effort variant of [`convert_to_reporting_currency`]; a failed
/// conversion is logged and reported as absent.
pub async fn try_convert_to_reporting_currency(
    rates: &dyn RateSource,
    amount: i64,
    currency: &str,
) -> Option<i64> {
    match convert_to_reporting_currency(rates, amount, currency).await {
        Ok(converted) => Some(converted),
        Err(e) => {
            warn!(
                "Could not convert {} {} to {}: {}",
                format_amount(amount),
                currency,
                REPORTING_CURRENCY,
                e
            );
            None
        }
    }
}
