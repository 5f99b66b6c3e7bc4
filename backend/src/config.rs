//! Runtime configuration for the donation tracker.
//!
//! Configuration is read from a YAML file whose path comes from
//! `DONATION_TRACKER_CONFIG`. Every field has a default, so a missing file
//! section (or no file at all) still yields a usable config. A couple of
//! deployment-specific values can be overridden from the environment.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

pub const CONFIG_PATH_ENV: &str = "DONATION_TRACKER_CONFIG";
pub const DATABASE_URL_ENV: &str = "DONATION_TRACKER_DATABASE_URL";
pub const JUSTGIVING_APP_ID_ENV: &str = "JUSTGIVING_APP_ID";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub reconciliation: ReconciliationConfig,
    pub justgiving: JustGivingConfig,
    pub reporting: ReportingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:donations.db".to_string(),
            reconciliation: ReconciliationConfig::default(),
            justgiving: JustGivingConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

/// Timing and batching of the reconciliation sweep.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// A pending donation the ledger has never seen is rejected after this long
    pub expiration_window_secs: u64,
    /// Pause between two sweeps
    pub sweep_interval_secs: u64,
    /// Minimum time between two checks of the same donation
    pub recheck_interval_secs: u64,
    /// Maximum donations selected per sweep
    pub batch_size: u32,
    /// Maximum reconciliations in flight at once
    pub concurrency: usize,
    /// Deadline for a single reconciliation, ledger call and write included
    pub check_timeout_secs: u64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            expiration_window_secs: 24 * 60 * 60,
            sweep_interval_secs: 60,
            recheck_interval_secs: 5 * 60,
            batch_size: 50,
            concurrency: 4,
            check_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JustGivingConfig {
    pub api_url: String,
    pub app_id: String,
    /// Base of the hosted donate pages
    pub link_url: String,
    /// Where JustGiving sends the donor back to after paying
    pub exit_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for JustGivingConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.justgiving.com".to_string(),
            app_id: String::new(),
            link_url: "https://link.justgiving.com".to_string(),
            exit_base_url: "http://localhost:9000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// USD value of one unit of each currency
    pub rates: HashMap<String, Decimal>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        let rates = [
            ("GBP", Decimal::new(127, 2)),
            ("EUR", Decimal::new(108, 2)),
            ("CAD", Decimal::new(73, 2)),
            ("AUD", Decimal::new(66, 2)),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();

        Self { rates }
    }
}

impl Config {
    /// Parse a config from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid donation tracker config")
    }

    /// Read a config file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    /// Load the config named by `DONATION_TRACKER_CONFIG` (defaults when unset)
    /// and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                info!("Loading config from {}", path);
                Self::from_file(path)?
            }
            Err(_) => {
                info!("{} not set, using default config", CONFIG_PATH_ENV);
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            self.database_url = url;
        }
        if let Some(app_id) = lookup(JUSTGIVING_APP_ID_ENV) {
            self.justgiving.app_id = app_id;
        }
    }
}
