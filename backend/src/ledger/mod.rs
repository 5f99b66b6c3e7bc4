//! External ledger integration.
//!
//! JustGiving processes the donor's payment and is the source of truth for a
//! donation's settlement status. The domain talks to it only through the
//! [`LedgerClient`] trait.

/// Ledger client abstraction
mod client;
/// JustGiving REST adapter and donate-link builder
mod justgiving;
/// Wire types and errors shared by ledger adapters
mod types;

#[cfg(test)]
pub mod stub;

pub use client::LedgerClient;
pub use justgiving::JustGivingClient;
pub use types::*;
