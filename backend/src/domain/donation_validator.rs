//! Creation-time checks on a donation. Pure; touches no storage.

use crate::domain::commands::CreateDonationCommand;
use crate::domain::money::{normalize_currency, MoneyError};

/// Validate a create command, normalizing its currency code in place.
pub fn validate(command: &mut CreateDonationCommand) -> Result<(), MoneyError> {
    command.donor_currency = normalize_currency(&command.donor_currency)?;

    if command.donor_amount < 0 {
        return Err(MoneyError::NegativeAmount);
    }

    Ok(())
}
