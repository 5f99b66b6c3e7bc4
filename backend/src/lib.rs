//! # Donation Tracker Backend
//!
//! Tracks donations pledged through JustGiving and reconciles their settlement
//! status by polling the JustGiving API.
//!
//! ## Architecture
//!
//! ```text
//! Sweep daemon (src/main.rs)
//!     ↓
//! Domain Layer (lifecycle service, reconciliation sweep, money rules)
//!     ↓                      ↓                      ↓
//! Storage Layer (SQLite)   Ledger (JustGiving)   Rates (static table)
//! ```
//!
//! The domain layer only sees the storage, ledger and rate abstractions, so
//! every adapter can be swapped for a test double.

pub mod config;
pub mod domain;
pub mod io;
pub mod ledger;
pub mod rates;
pub mod storage;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::ledger::JustGivingClient;
use crate::rates::StaticRateTable;
use crate::storage::DbConnection;

pub use domain::*;

/// Everything the sweep daemon needs, wired against the production adapters.
#[derive(Clone)]
pub struct AppState {
    pub donation_service: DonationService<DbConnection>,
    pub sweep: ReconciliationSweep<DbConnection, JustGivingClient>,
    pub ledger: Arc<JustGivingClient>,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db_conn = DbConnection::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    info!("Setting up JustGiving client for {}", config.justgiving.api_url);
    let ledger = Arc::new(JustGivingClient::new(&config.justgiving)?);

    let rates = Arc::new(StaticRateTable::new(config.reporting.rates.clone()));
    let expiration_window =
        Duration::from_secs(config.reconciliation.expiration_window_secs);

    info!("Setting up domain services");
    let donation_service = DonationService::new(Arc::new(db_conn), rates, expiration_window);
    let sweep = ReconciliationSweep::new(
        donation_service.clone(),
        ledger.clone(),
        SweepConfig::from(&config.reconciliation),
    );

    Ok(AppState {
        donation_service,
        sweep,
        ledger,
    })
}
