//! Recurring reconciliation of Pending donations.
//!
//! Each sweep selects a batch of Pending donations that are due for a check
//! and reconciles them against the ledger with bounded parallelism. Every
//! reconciliation gets its own deadline; a donation whose check fails is
//! simply picked up again by a later sweep.

use chrono::Duration as ChronoDuration;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ReconciliationConfig;
use crate::domain::donation_service::{now, DonationService};
use crate::domain::models::{Donation, DonationStatus};
use crate::domain::DonationError;
use crate::ledger::{LedgerClient, LedgerError};
use crate::storage::Connection;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub sweep_interval: Duration,
    pub recheck_interval: Duration,
    pub batch_size: u32,
    pub concurrency: usize,
    pub check_timeout: Duration,
}

impl From<&ReconciliationConfig> for SweepConfig {
    fn from(config: &ReconciliationConfig) -> Self {
        Self {
            sweep_interval: Duration::from_secs(config.sweep_interval_secs.max(1)),
            recheck_interval: Duration::from_secs(config.recheck_interval_secs),
            batch_size: config.batch_size,
            concurrency: config.concurrency.max(1),
            check_timeout: Duration::from_secs(config.check_timeout_secs.max(1)),
        }
    }
}

/// Outcome counts of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub still_pending: usize,
    pub failed: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: &Result<DonationStatus, DonationError>) {
        self.checked += 1;
        match outcome {
            Ok(DonationStatus::Accepted) => self.accepted += 1,
            Ok(DonationStatus::Rejected) => self.rejected += 1,
            Ok(DonationStatus::Pending) => self.still_pending += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// One-line summary for the sweep log
    pub fn summary(&self) -> String {
        format!(
            "Reconciled {} donations: {} accepted, {} rejected, {} still pending{}",
            self.checked,
            self.accepted,
            self.rejected,
            self.still_pending,
            if self.failed == 0 {
                String::new()
            } else {
                format!(" ({} failed)", self.failed)
            }
        )
    }
}

pub struct ReconciliationSweep<C: Connection, L: LedgerClient> {
    service: DonationService<C>,
    ledger: Arc<L>,
    config: SweepConfig,
}

impl<C: Connection, L: LedgerClient> Clone for ReconciliationSweep<C, L> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            ledger: self.ledger.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: Connection, L: LedgerClient> ReconciliationSweep<C, L> {
    pub fn new(service: DonationService<C>, ledger: Arc<L>, config: SweepConfig) -> Self {
        Self {
            service,
            ledger,
            config,
        }
    }

    /// Reconcile one batch of due donations.
    ///
    /// Only a failure to select the batch is returned as an error; failures of
    /// individual donations are logged and counted in the report.
    pub async fn run_once(&self) -> Result<SweepReport, DonationError> {
        let recheck = ChronoDuration::from_std(self.config.recheck_interval)
            .unwrap_or_else(|_| ChronoDuration::zero());
        let checked_before = now() - recheck;

        let candidates = self
            .service
            .find_pending_due_for_check(checked_before, self.config.batch_size)
            .await?;

        let mut report = SweepReport::default();
        if candidates.is_empty() {
            debug!("No donations due for reconciliation");
            return Ok(report);
        }

        let outcomes: Vec<_> = stream::iter(candidates)
            .map(|donation| self.check(donation))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        for outcome in &outcomes {
            report.record(outcome);
        }
        info!("{}", report.summary());
        Ok(report)
    }

    async fn check(&self, mut donation: Donation) -> Result<DonationStatus, DonationError> {
        let reconciliation = self
            .service
            .reconcile_donation(&mut donation, self.ledger.as_ref());
        let result = match tokio::time::timeout(self.config.check_timeout, reconciliation).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout.into()),
        };

        match result {
            Ok(()) => Ok(donation.status),
            Err(e) if e.is_transient() => {
                warn!("Could not reconcile {}: {}", donation.reference_code, e);
                Err(e)
            }
            Err(e) => {
                error!("Reconciling {} failed: {}", donation.reference_code, e);
                Err(e)
            }
        }
    }

    /// Sweep every `sweep_interval` until `shutdown` resolves.
    ///
    /// A batch already in progress is finished before stopping.
    pub async fn run<F: Future>(&self, shutdown: F) {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Reconciliation sweep running every {:?} ({} donations per batch, {} at a time)",
            self.config.sweep_interval, self.config.batch_size, self.config.concurrency
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping reconciliation sweep");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!("Selecting donations to reconcile failed: {}", e);
                    }
                }
            }
        }
    }
}
