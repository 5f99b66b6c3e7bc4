//! Donation lifecycle.
//!
//! A donation is created Pending with a fresh reference code, and moves to
//! Accepted or Rejected only through reconciliation against the external
//! ledger. Both terminal states are final.
//!
//! ## Reconciliation
//!
//! - Ledger knows the donation: its reported status is adopted, along with the
//!   settled amount and currency when present
//! - Ledger has never heard of it: the donation stays Pending until it is
//!   older than the expiration window, then it is Rejected
//! - Ledger could not be asked: nothing changes and the error is returned
//!
//! Every successful check records `last_checked`. Writes are guarded by the
//! donation's `version`, so two concurrent reconciliations of the same
//! donation cannot both win.

use chrono::{DateTime, SubsecRound, Utc};
use shared::DonationView;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::commands::{CreateDonationCommand, UpdateDonorDetailsCommand};
use crate::domain::donation_validator;
use crate::domain::models::{Charity, Donation, DonationDetails, DonationStatus, Drive};
use crate::domain::money::{
    canonical_currency, format_amount, parse_amount, try_convert_to_reporting_currency,
};
use crate::domain::reference_code::generate_reference_code;
use crate::domain::DonationError;
use crate::io::DonationMapper;
use crate::ledger::{LedgerClient, LedgerDonation, LedgerError};
use crate::rates::RateSource;
use crate::storage::{CharityStorage, Connection, DonationStorage, DriveStorage};

/// Current time at the precision storage keeps (microseconds)
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub struct DonationService<C: Connection> {
    donation_repository: Arc<C::DonationRepository>,
    charity_repository: Arc<C::CharityRepository>,
    drive_repository: Arc<C::DriveRepository>,
    rates: Arc<dyn RateSource>,
    expiration_window: Duration,
}

impl<C: Connection> Clone for DonationService<C> {
    fn clone(&self) -> Self {
        Self {
            donation_repository: self.donation_repository.clone(),
            charity_repository: self.charity_repository.clone(),
            drive_repository: self.drive_repository.clone(),
            rates: self.rates.clone(),
            expiration_window: self.expiration_window,
        }
    }
}

impl<C: Connection> DonationService<C> {
    pub fn new(
        connection: Arc<C>,
        rates: Arc<dyn RateSource>,
        expiration_window: Duration,
    ) -> Self {
        Self {
            donation_repository: Arc::new(connection.create_donation_repository()),
            charity_repository: Arc::new(connection.create_charity_repository()),
            drive_repository: Arc::new(connection.create_drive_repository()),
            rates,
            expiration_window,
        }
    }

    /// Create a Pending donation with a fresh reference code.
    ///
    /// Nothing is written unless every check passes.
    pub async fn create_donation(
        &self,
        mut command: CreateDonationCommand,
    ) -> Result<DonationDetails, DonationError> {
        let charity_id = non_blank(command.charity_id.take()).ok_or(DonationError::NoCharity)?;
        let charity = self.load_charity(&charity_id).await?;

        if non_blank(command.reference_code.take()).is_some() {
            return Err(DonationError::AlreadyInserted);
        }

        donation_validator::validate(&mut command)?;

        let drive = match non_blank(command.drive_id.take()) {
            Some(drive_id) => Some(self.load_drive(&drive_id).await?),
            None => None,
        };

        let repository = self.donation_repository.clone();
        let reference_code = generate_reference_code(|candidate| {
            let repository = repository.clone();
            async move { repository.reference_code_exists(&candidate).await }
        })
        .await?;

        let mut donation = Donation {
            id: Donation::generate_id(),
            reference_code,
            charity_id: charity.id.clone(),
            drive_id: drive.as_ref().map(|d| d.id.clone()),
            donor_amount: command.donor_amount,
            donor_currency: command.donor_currency,
            donor_name: non_blank(command.donor_name),
            message: non_blank(command.message),
            final_amount: None,
            final_currency: None,
            usd_amount: None,
            status: DonationStatus::Pending,
            created_at: now(),
            last_checked: None,
            version: 0,
        };
        donation.id = self.donation_repository.insert(&donation).await?;

        info!(
            "Created donation {} of {} {} to {}",
            donation.reference_code,
            format_amount(donation.donor_amount),
            donation.donor_currency,
            charity.name
        );

        Ok(DonationDetails {
            donation,
            charity,
            drive,
        })
    }

    /// Ask the ledger about a Pending donation and store the outcome.
    ///
    /// `donation` is only replaced once the new state has been written; on
    /// any error it is left as it was.
    pub async fn reconcile_donation(
        &self,
        donation: &mut Donation,
        ledger: &dyn LedgerClient,
    ) -> Result<(), DonationError> {
        if donation.reference_code.trim().is_empty() {
            return Err(DonationError::MissingReferenceCode);
        }
        if donation.status.is_terminal() {
            return Err(DonationError::NotPending {
                reference_code: donation.reference_code.clone(),
                status: donation.status,
            });
        }

        let reported = ledger
            .get_status_by_reference(&donation.reference_code)
            .await?;

        let checked_at = now();
        let mut updated = donation.clone();
        match reported {
            Some(entry) => self.apply_ledger_entry(&mut updated, &entry).await?,
            None => {
                if self.should_expire(&updated, checked_at) {
                    updated.status = DonationStatus::Rejected;
                } else {
                    debug!(
                        "Donation {} not on the ledger yet",
                        updated.reference_code
                    );
                }
            }
        }
        updated.last_checked = Some(checked_at);

        if !self.donation_repository.update(&updated).await? {
            return Err(DonationError::ConcurrentModification(updated.id));
        }
        updated.version += 1;

        if updated.status != donation.status {
            info!(
                "Donation {} moved from {} to {}",
                updated.reference_code, donation.status, updated.status
            );
        }
        *donation = updated;
        Ok(())
    }

    async fn apply_ledger_entry(
        &self,
        donation: &mut Donation,
        entry: &LedgerDonation,
    ) -> Result<(), DonationError> {
        if let Some(reference) = entry.third_party_reference.as_deref() {
            if reference != donation.reference_code {
                warn!(
                    "Ledger returned reference {} when asked for {}",
                    reference, donation.reference_code
                );
            }
        }

        donation.status = DonationStatus::from_external(&entry.status).ok_or_else(|| {
            LedgerError::Malformed(format!("unknown donation status {:?}", entry.status))
        })?;

        if let (Some(raw_amount), Some(raw_currency)) =
            (entry.amount.as_deref(), entry.currency_code.as_deref())
        {
            let amount = parse_amount(raw_amount).map_err(|e| {
                LedgerError::Malformed(format!("amount {:?}: {}", raw_amount, e))
            })?;
            let currency = canonical_currency(raw_currency).map_err(|e| {
                LedgerError::Malformed(format!("currency {:?}: {}", raw_currency, e))
            })?;

            donation.usd_amount =
                try_convert_to_reporting_currency(self.rates.as_ref(), amount, &currency).await;
            donation.final_amount = Some(amount);
            donation.final_currency = Some(currency);
        }

        Ok(())
    }

    /// Whether a Pending donation the ledger has never seen should be rejected
    pub fn should_expire(&self, donation: &Donation, now: DateTime<Utc>) -> bool {
        donation.should_expire(now, self.expiration_window)
    }

    pub fn expiration_window(&self) -> Duration {
        self.expiration_window
    }

    pub async fn find_by_id(&self, id: &str) -> Result<DonationDetails, DonationError> {
        let donation = self
            .donation_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DonationError::DonationNotFound(id.to_string()))?;
        self.load_details(donation).await
    }

    pub async fn find_by_reference_code(
        &self,
        reference_code: &str,
    ) -> Result<DonationDetails, DonationError> {
        let donation = self
            .donation_repository
            .find_by_reference_code(reference_code)
            .await?
            .ok_or_else(|| DonationError::DonationNotFound(reference_code.to_string()))?;
        self.load_details(donation).await
    }

    /// Edit the donor's name and message. Status and amounts are untouched.
    pub async fn update_donor_details(
        &self,
        command: UpdateDonorDetailsCommand,
    ) -> Result<Donation, DonationError> {
        let mut donation = self
            .donation_repository
            .find_by_id(&command.donation_id)
            .await?
            .ok_or_else(|| DonationError::DonationNotFound(command.donation_id.clone()))?;

        donation.donor_name = non_blank(command.donor_name);
        donation.message = non_blank(command.message);

        if !self.donation_repository.update(&donation).await? {
            return Err(DonationError::ConcurrentModification(donation.id));
        }
        donation.version += 1;

        info!("Updated donor details of {}", donation.reference_code);
        Ok(donation)
    }

    /// Accepted donations, newest first, ready for display
    pub async fn recent_donations(&self, limit: u32) -> Result<Vec<DonationView>, DonationError> {
        let donations = self.donation_repository.list_recent_accepted(limit).await?;

        let mut drive_ids: Vec<String> = donations
            .iter()
            .filter_map(|d| d.drive_id.clone())
            .collect();
        drive_ids.sort();
        drive_ids.dedup();
        let drives: HashMap<String, Drive> = self
            .drive_repository
            .find_drives(&drive_ids)
            .await?
            .into_iter()
            .map(|drive| (drive.id.clone(), drive))
            .collect();

        let mut charities: HashMap<String, Charity> = HashMap::new();
        let mut views = Vec::with_capacity(donations.len());
        for donation in donations {
            let drive = match donation.drive_id.as_deref() {
                Some(id) => Some(
                    drives
                        .get(id)
                        .cloned()
                        .ok_or_else(|| DonationError::DriveNotFound(id.to_string()))?,
                ),
                None => None,
            };

            let charity = match charities.get(&donation.charity_id).cloned() {
                Some(charity) => charity,
                None => {
                    let charity = self.load_charity(&donation.charity_id).await?;
                    charities.insert(charity.id.clone(), charity.clone());
                    charity
                }
            };

            views.push(DonationMapper::to_dto(&DonationDetails {
                donation,
                charity,
                drive,
            }));
        }

        Ok(views)
    }

    /// Pending donations never checked, or last checked at or before `checked_before`
    pub async fn find_pending_due_for_check(
        &self,
        checked_before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Donation>, DonationError> {
        Ok(self
            .donation_repository
            .find_pending_due_for_check(checked_before, limit)
            .await?)
    }

    async fn load_details(&self, donation: Donation) -> Result<DonationDetails, DonationError> {
        if donation.charity_id.trim().is_empty() {
            warn!("Donation {} has no charity", donation.reference_code);
            return Err(DonationError::NoCharity);
        }
        let charity = self.load_charity(&donation.charity_id).await?;
        let drive = match donation.drive_id.as_deref() {
            Some(drive_id) => Some(self.load_drive(drive_id).await?),
            None => None,
        };

        Ok(DonationDetails {
            donation,
            charity,
            drive,
        })
    }

    async fn load_charity(&self, charity_id: &str) -> Result<Charity, DonationError> {
        self.charity_repository
            .find_charity(charity_id)
            .await?
            .ok_or_else(|| DonationError::CharityNotFound(charity_id.to_string()))
    }

    async fn load_drive(&self, drive_id: &str) -> Result<Drive, DonationError> {
        self.drive_repository
            .find_drive(drive_id)
            .await?
            .ok_or_else(|| DonationError::DriveNotFound(drive_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::MoneyError;
    use crate::ledger::stub::{StubLedger, StubResponse};
    use crate::rates::StaticRateTable;
    use crate::storage::sqlite::test_utils::TestEnvironment;
    use crate::storage::DbConnection;
    use chrono::Duration as ChronoDuration;
    use rust_decimal::Decimal;
    use sqlx::Row;
    use std::collections::HashSet;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    async fn create_test_service() -> (TestEnvironment, DonationService<DbConnection>) {
        let env = TestEnvironment::new()
            .await
            .expect("Failed to create test environment");
        let rates = Arc::new(StaticRateTable::new(HashMap::from([(
            "GBP".to_string(),
            Decimal::new(127, 2),
        )])));
        let service = DonationService::new(Arc::new(env.connection.clone()), rates, DAY);
        (env, service)
    }

    fn create_command(env: &TestEnvironment, amount: i64, currency: &str) -> CreateDonationCommand {
        CreateDonationCommand {
            charity_id: Some(env.charity.id.clone()),
            donor_amount: amount,
            donor_currency: currency.to_string(),
            ..Default::default()
        }
    }

    async fn stored_donation_count(env: &TestEnvironment) -> i64 {
        sqlx::query("SELECT COUNT(*) AS n FROM donations")
            .fetch_one(env.connection.pool())
            .await
            .unwrap()
            .get("n")
    }

    /// Insert a Pending donation created `age` ago, bypassing the service
    async fn insert_aged(env: &TestEnvironment, reference_code: &str, age: ChronoDuration) -> Donation {
        let donation = env.pending_donation(reference_code, age);
        env.donation_repository().insert(&donation).await.unwrap();
        donation
    }

    #[tokio::test]
    async fn test_create_donation() {
        let (env, service) = create_test_service().await;
        let before = Utc::now();

        let mut command = create_command(&env, 1234, "gbp");
        command.drive_id = Some(env.drive.id.clone());
        command.donor_name = Some("  ".to_string());
        command.message = Some("Go team".to_string());
        let details = service.create_donation(command).await.unwrap();

        let donation = &details.donation;
        assert!(donation.reference_code.starts_with("ch-"));
        assert_eq!(donation.status, DonationStatus::Pending);
        assert_eq!(donation.donor_amount, 1234);
        assert_eq!(donation.donor_currency, "GBP");
        assert_eq!(donation.donor_name, None);
        assert_eq!(donation.message.as_deref(), Some("Go team"));
        assert_eq!(donation.last_checked, None);
        assert!(donation.created_at >= before.trunc_subsecs(6));
        assert_eq!(details.charity, env.charity);
        assert_eq!(details.drive.as_ref(), Some(&env.drive));

        let stored = service.find_by_id(&donation.id).await.unwrap();
        assert_eq!(stored, details);
    }

    #[tokio::test]
    async fn test_cloned_service_shares_storage() {
        let (env, service) = create_test_service().await;
        let cloned = service.clone();

        let details = cloned.create_donation(create_command(&env, 500, "GBP")).await.unwrap();

        let found = service
            .find_by_reference_code(&details.donation.reference_code)
            .await
            .unwrap();
        assert_eq!(found, details);
        assert_eq!(cloned.expiration_window(), service.expiration_window());
    }

    #[tokio::test]
    async fn test_created_reference_codes_are_unique() {
        let (env, service) = create_test_service().await;

        let mut codes = HashSet::new();
        for _ in 0..20 {
            let details = service
                .create_donation(create_command(&env, 500, "USD"))
                .await
                .unwrap();
            assert!(!details.donation.reference_code.is_empty());
            codes.insert(details.donation.reference_code);
        }
        assert_eq!(codes.len(), 20);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_amount_without_writing() {
        let (env, service) = create_test_service().await;

        let result = service.create_donation(create_command(&env, -5, "USD")).await;

        assert!(matches!(
            result,
            Err(DonationError::Money(MoneyError::NegativeAmount))
        ));
        assert_eq!(stored_donation_count(&env).await, 0);
    }

    #[tokio::test]
    async fn test_create_precondition_errors() {
        let (env, service) = create_test_service().await;

        let mut no_charity = create_command(&env, 100, "USD");
        no_charity.charity_id = None;
        assert!(matches!(
            service.create_donation(no_charity).await,
            Err(DonationError::NoCharity)
        ));

        let mut blank_charity = create_command(&env, 100, "USD");
        blank_charity.charity_id = Some(" ".to_string());
        assert!(matches!(
            service.create_donation(blank_charity).await,
            Err(DonationError::NoCharity)
        ));

        let mut unknown_charity = create_command(&env, 100, "USD");
        unknown_charity.charity_id = Some("charity::nope".to_string());
        assert!(matches!(
            service.create_donation(unknown_charity).await,
            Err(DonationError::CharityNotFound(id)) if id == "charity::nope"
        ));

        let mut already_inserted = create_command(&env, 100, "USD");
        already_inserted.reference_code = Some("ch-existing".to_string());
        assert!(matches!(
            service.create_donation(already_inserted).await,
            Err(DonationError::AlreadyInserted)
        ));

        assert!(matches!(
            service.create_donation(create_command(&env, 100, "")).await,
            Err(DonationError::Money(MoneyError::NoCurrencyCode))
        ));

        assert!(matches!(
            service.create_donation(create_command(&env, 100, "XYZ")).await,
            Err(DonationError::Money(MoneyError::UnsupportedCurrency(_)))
        ));

        let mut unknown_drive = create_command(&env, 100, "USD");
        unknown_drive.drive_id = Some("drive::nope".to_string());
        assert!(matches!(
            service.create_donation(unknown_drive).await,
            Err(DonationError::DriveNotFound(_))
        ));

        assert_eq!(stored_donation_count(&env).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_old_donation_is_rejected() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        let mut donation = insert_aged(&env, "ch-old", ChronoDuration::hours(25)).await;

        service.reconcile_donation(&mut donation, &ledger).await.unwrap();

        assert_eq!(donation.status, DonationStatus::Rejected);
        assert!(donation.last_checked.is_some());
        assert_eq!(donation.version, 1);

        let stored = service.find_by_reference_code("ch-old").await.unwrap();
        assert_eq!(stored.donation, donation);
    }

    #[tokio::test]
    async fn test_unknown_recent_donation_stays_pending() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        let mut donation = insert_aged(&env, "ch-new", ChronoDuration::hours(1)).await;

        service.reconcile_donation(&mut donation, &ledger).await.unwrap();

        assert_eq!(donation.status, DonationStatus::Pending);
        assert!(donation.last_checked.is_some());
        assert_eq!(ledger.calls(), vec!["ch-new".to_string()]);

        let stored = service.find_by_id(&donation.id).await.unwrap().donation;
        assert_eq!(stored.status, DonationStatus::Pending);
        assert_eq!(stored.last_checked, donation.last_checked);
    }

    #[tokio::test]
    async fn test_accepted_donation_records_settlement() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        ledger.respond(
            "ch-paid",
            StubResponse::Found(LedgerDonation::settled("Accepted", "2.00", "GBP")),
        );
        let mut donation = insert_aged(&env, "ch-paid", ChronoDuration::hours(1)).await;

        service.reconcile_donation(&mut donation, &ledger).await.unwrap();

        assert_eq!(donation.status, DonationStatus::Accepted);
        assert_eq!(donation.final_amount, Some(200));
        assert_eq!(donation.final_currency.as_deref(), Some("GBP"));
        assert_eq!(donation.usd_amount, Some(254));
        let checked = donation.last_checked.unwrap();
        assert!((Utc::now() - checked) < ChronoDuration::seconds(1));

        let stored = service.find_by_id(&donation.id).await.unwrap().donation;
        assert_eq!(stored, donation);
    }

    #[tokio::test]
    async fn test_mismatched_ledger_reference_still_reconciles() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        let mut entry = LedgerDonation::settled("Accepted", "2.00", "GBP");
        entry.third_party_reference = Some("ch-someone-else".to_string());
        ledger.respond("ch-mine", StubResponse::Found(entry));
        let mut donation = insert_aged(&env, "ch-mine", ChronoDuration::hours(1)).await;

        service.reconcile_donation(&mut donation, &ledger).await.unwrap();

        assert_eq!(donation.status, DonationStatus::Accepted);
        assert_eq!(donation.reference_code, "ch-mine");
        assert_eq!(donation.final_amount, Some(200));
    }

    #[tokio::test]
    async fn test_status_is_case_insensitive_and_usd_is_best_effort() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        ledger.respond(
            "ch-nzd",
            StubResponse::Found(LedgerDonation::settled("ACCEPTED", "10", "nzd")),
        );
        let mut donation = insert_aged(&env, "ch-nzd", ChronoDuration::hours(1)).await;

        service.reconcile_donation(&mut donation, &ledger).await.unwrap();

        assert_eq!(donation.status, DonationStatus::Accepted);
        assert_eq!(donation.final_amount, Some(1000));
        assert_eq!(donation.final_currency.as_deref(), Some("NZD"));
        // no NZD rate configured
        assert_eq!(donation.usd_amount, None);
    }

    #[tokio::test]
    async fn test_reported_status_without_amount() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        ledger.respond("ch-declined", StubResponse::Found(LedgerDonation::with_status("Rejected")));
        let mut donation = insert_aged(&env, "ch-declined", ChronoDuration::hours(1)).await;

        service.reconcile_donation(&mut donation, &ledger).await.unwrap();

        assert_eq!(donation.status, DonationStatus::Rejected);
        assert_eq!(donation.final_amount, None);
        assert_eq!(donation.usd_amount, None);
    }

    #[tokio::test]
    async fn test_ledger_failure_leaves_donation_untouched() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        ledger.respond("ch-down", StubResponse::Unavailable);
        let original = insert_aged(&env, "ch-down", ChronoDuration::hours(30)).await;
        let mut donation = original.clone();

        let err = service
            .reconcile_donation(&mut donation, &ledger)
            .await
            .unwrap_err();

        assert!(matches!(err, DonationError::Ledger(LedgerError::UnexpectedStatus(503))));
        assert!(err.is_transient());
        assert_eq!(donation, original);

        let stored = service.find_by_id(&original.id).await.unwrap().donation;
        assert_eq!(stored, original);
    }

    #[tokio::test]
    async fn test_malformed_ledger_entries_are_errors() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        ledger.respond("ch-weird", StubResponse::Found(LedgerDonation::with_status("Refunded")));
        ledger.respond(
            "ch-garbled",
            StubResponse::Found(LedgerDonation::settled("Accepted", "two pounds", "GBP")),
        );
        ledger.respond(
            "ch-overflow",
            StubResponse::Found(LedgerDonation::settled(
                "Accepted",
                "79228162514264337593543950335",
                "GBP",
            )),
        );

        for code in ["ch-weird", "ch-garbled", "ch-overflow"] {
            let original = insert_aged(&env, code, ChronoDuration::hours(1)).await;
            let mut donation = original.clone();

            let err = service
                .reconcile_donation(&mut donation, &ledger)
                .await
                .unwrap_err();

            assert!(matches!(err, DonationError::Ledger(LedgerError::Malformed(_))), "{}", code);
            assert_eq!(donation, original);
            let stored = service.find_by_id(&original.id).await.unwrap().donation;
            assert_eq!(stored, original, "{}", code);
        }
    }

    #[tokio::test]
    async fn test_reconcile_refuses_terminal_and_unreferenced_donations() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();

        let mut accepted = env.pending_donation("ch-done", ChronoDuration::hours(1));
        accepted.status = DonationStatus::Accepted;
        assert!(matches!(
            service.reconcile_donation(&mut accepted, &ledger).await,
            Err(DonationError::NotPending { status: DonationStatus::Accepted, .. })
        ));

        let mut unreferenced = env.pending_donation("", ChronoDuration::hours(1));
        assert!(matches!(
            service.reconcile_donation(&mut unreferenced, &ledger).await,
            Err(DonationError::MissingReferenceCode)
        ));

        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_reconciliation_loses_cleanly() {
        let (env, service) = create_test_service().await;
        let ledger = StubLedger::new();
        ledger.respond(
            "ch-race",
            StubResponse::Found(LedgerDonation::settled("Accepted", "5.00", "USD")),
        );
        let original = insert_aged(&env, "ch-race", ChronoDuration::hours(1)).await;
        let mut first = original.clone();
        let mut second = original.clone();

        service.reconcile_donation(&mut first, &ledger).await.unwrap();
        let err = service
            .reconcile_donation(&mut second, &ledger)
            .await
            .unwrap_err();

        assert!(matches!(err, DonationError::ConcurrentModification(_)));
        assert_eq!(second, original);
        assert_eq!(first.usd_amount, Some(500));
    }

    #[tokio::test]
    async fn test_should_expire() {
        let (env, service) = create_test_service().await;

        let old = env.pending_donation("ch-a", ChronoDuration::hours(25));
        let young = env.pending_donation("ch-b", ChronoDuration::hours(1));
        assert!(service.should_expire(&old, env.now));
        assert!(!service.should_expire(&young, env.now));
    }

    #[tokio::test]
    async fn test_find_missing_donation() {
        let (_env, service) = create_test_service().await;

        assert!(matches!(
            service.find_by_reference_code("ch-nope").await,
            Err(DonationError::DonationNotFound(code)) if code == "ch-nope"
        ));
        assert!(matches!(
            service.find_by_id("nope").await,
            Err(DonationError::DonationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_donor_details() {
        let (env, service) = create_test_service().await;
        let created = service
            .create_donation(create_command(&env, 700, "EUR"))
            .await
            .unwrap()
            .donation;

        let updated = service
            .update_donor_details(UpdateDonorDetailsCommand {
                donation_id: created.id.clone(),
                donor_name: Some("Grace".to_string()),
                message: Some("".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(updated.donor_name.as_deref(), Some("Grace"));
        assert_eq!(updated.message, None);
        assert_eq!(updated.status, DonationStatus::Pending);
        assert_eq!(updated.donor_amount, 700);
        assert_eq!(updated.version, 1);

        let stored = service.find_by_id(&created.id).await.unwrap().donation;
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_recent_donations() {
        let (env, service) = create_test_service().await;
        let repository = env.donation_repository();

        for (code, age_hours, status, with_drive) in [
            ("ch-old", 3, DonationStatus::Accepted, false),
            ("ch-new", 1, DonationStatus::Accepted, true),
            ("ch-no", 2, DonationStatus::Rejected, true),
        ] {
            let mut donation = env.pending_donation(code, ChronoDuration::hours(age_hours));
            donation.status = status;
            if with_drive {
                donation.drive_id = Some(env.drive.id.clone());
            }
            repository.insert(&donation).await.unwrap();
        }

        let views = service.recent_donations(10).await.unwrap();

        let codes: Vec<&str> = views.iter().map(|v| v.reference_code.as_str()).collect();
        assert_eq!(codes, vec!["ch-new", "ch-old"]);
        assert_eq!(views[0].drive.as_ref().map(|d| d.id.as_str()), Some(env.drive.id.as_str()));
        assert_eq!(views[1].drive, None);
        assert_eq!(views[0].donor_name, "Anonymous");
        assert_eq!(views[0].charity.id, env.charity.id);
    }

    #[tokio::test]
    async fn test_recent_donations_with_missing_drive() {
        let (env, service) = create_test_service().await;

        let mut donation = env.pending_donation("ch-ghost", ChronoDuration::hours(1));
        donation.status = DonationStatus::Accepted;
        donation.drive_id = Some("drive::ghost".to_string());
        env.donation_repository().insert(&donation).await.unwrap();

        assert!(matches!(
            service.recent_donations(10).await,
            Err(DonationError::DriveNotFound(id)) if id == "drive::ghost"
        ));
    }
}
