use std::fmt::Debug;

use cpg_common::Money;
use log::*;
use sqlx::SqlitePool;

use super::{audit, beneficiaries, db_url, donations, funds, new_pool, withdrawals};
use crate::{
    db_types::{
        ActivityEntry,
        Beneficiary,
        Donation,
        DonationStatus,
        Fund,
        NewActivityEntry,
        NewBeneficiary,
        NewDonation,
        NewFund,
        NewWithdrawal,
        TransactionRef,
        UpdateBeneficiary,
        Withdrawal,
    },
    traits::{
        AuditManagement,
        BeneficiaryManagement,
        DonationLedgerDatabase,
        FinalizeDonationResult,
        FundManagement,
        LedgerError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, LedgerError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl DonationLedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_donation(&self, donation: NewDonation) -> Result<(Donation, bool), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        donations::idempotent_insert(donation, &mut conn).await
    }

    /// Takes a webhook outcome for a transaction reference and, in a single atomic transaction,
    /// * flips the donation status out of Pending (guarded by the current status, so at most once);
    /// * if the outcome is Complete, credits the fund with the donation amount.
    ///
    /// A duplicate or contradicting delivery finds the status already terminal and changes nothing.
    async fn finalize_donation(
        &self,
        reference: &TransactionRef,
        outcome: DonationStatus,
    ) -> Result<FinalizeDonationResult, LedgerError> {
        if !outcome.is_terminal() {
            return Err(LedgerError::Validation(format!(
                "Donation [{reference}] cannot be finalized to non-terminal status {outcome}"
            )));
        }
        let mut tx = self.pool.begin().await?;
        let transitioned = donations::transition_from_pending(reference, outcome, &mut tx).await?;
        let result = match transitioned {
            Some(donation) => match outcome {
                DonationStatus::Complete => {
                    let new_balance = funds::credit(donation.fund_id, donation.amount, &mut tx).await?;
                    debug!(
                        "🗃️ Donation [{reference}] completed. Fund #{} credited with {}. New balance: {new_balance}",
                        donation.fund_id, donation.amount
                    );
                    FinalizeDonationResult::Completed { donation, new_balance }
                },
                _ => {
                    debug!("🗃️ Donation [{reference}] marked {outcome}. No ledger effect.");
                    FinalizeDonationResult::Failed { donation }
                },
            },
            None => match donations::fetch_donation_by_reference(reference, &mut tx).await? {
                Some(donation) => {
                    debug!(
                        "🗃️ Donation [{reference}] is already {}. Ignoring the {outcome} event.",
                        donation.status
                    );
                    FinalizeDonationResult::AlreadyFinalized(donation)
                },
                None => FinalizeDonationResult::NotFound,
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_donation_by_reference(&self, reference: &TransactionRef) -> Result<Option<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        donations::fetch_donation_by_reference(reference, &mut conn).await
    }

    async fn fetch_donation_by_id(&self, id: i64) -> Result<Option<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        donations::fetch_donation_by_id(id, &mut conn).await
    }

    async fn fetch_donations_for_fund(&self, fund_id: i64) -> Result<Vec<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        donations::fetch_donations_for_fund(fund_id, &mut conn).await
    }

    /// The balance check, the debit and the withdrawal row insert share one transaction: an insufficient
    /// balance aborts before the insert, and a crash after the debit rolls the debit back.
    async fn create_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<(Withdrawal, Money), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let new_balance = funds::debit(withdrawal.fund_id, withdrawal.amount, &mut tx).await?;
        let withdrawal = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Withdrawal #{} of {} from fund #{} recorded. Remaining balance: {new_balance}",
            withdrawal.id, withdrawal.amount, withdrawal.fund_id
        );
        Ok((withdrawal, new_balance))
    }

    async fn delete_withdrawal(&self, id: i64) -> Result<Withdrawal, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::delete_withdrawal(id, &mut conn).await
    }

    async fn fetch_withdrawals_for_fund(&self, fund_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::fetch_withdrawals_for_fund(fund_id, &mut conn).await
    }

    async fn fetch_withdrawals(&self) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::fetch_withdrawals(&mut conn).await
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl FundManagement for SqliteDatabase {
    async fn create_fund(&self, fund: NewFund) -> Result<Fund, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        funds::insert_fund(fund, &mut conn).await
    }

    async fn fetch_fund(&self, id: i64) -> Result<Option<Fund>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        funds::fetch_fund(id, &mut conn).await
    }

    async fn fetch_funds(&self) -> Result<Vec<Fund>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        funds::fetch_funds(&mut conn).await
    }

    async fn credit_fund(&self, fund_id: i64, amount: Money) -> Result<Money, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        funds::credit(fund_id, amount, &mut conn).await
    }

    async fn debit_fund(&self, fund_id: i64, amount: Money) -> Result<Money, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        funds::debit(fund_id, amount, &mut conn).await
    }
}

impl BeneficiaryManagement for SqliteDatabase {
    async fn insert_beneficiary(&self, beneficiary: NewBeneficiary) -> Result<(Beneficiary, bool), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let inserted = beneficiaries::idempotent_insert(beneficiary, &mut tx).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn fetch_beneficiary(&self, gateway_id: &str) -> Result<Option<Beneficiary>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        beneficiaries::fetch_by_gateway_id(gateway_id, &mut conn).await
    }

    async fn fetch_beneficiaries(&self) -> Result<Vec<Beneficiary>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        beneficiaries::fetch_all(&mut conn).await
    }

    async fn fetch_active_beneficiary(&self) -> Result<Option<Beneficiary>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        beneficiaries::fetch_active(&mut conn).await
    }

    async fn update_beneficiary(
        &self,
        gateway_id: &str,
        update: UpdateBeneficiary,
    ) -> Result<Beneficiary, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        beneficiaries::update(gateway_id, update, &mut conn).await
    }

    /// The "deactivate all, activate one" pair runs in a single transaction so no interleaving can observe
    /// zero or two active beneficiaries.
    async fn toggle_beneficiary(&self, gateway_id: &str) -> Result<Beneficiary, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let target = beneficiaries::fetch_by_gateway_id(gateway_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::BeneficiaryNotFound(gateway_id.to_string()))?;
        let result = if target.is_active {
            // Once any beneficiaries exist, exactly one must stay active.
            if beneficiaries::count_active(&mut tx).await? <= 1 {
                return Err(LedgerError::Conflict(format!(
                    "Beneficiary [{gateway_id}] is the only active beneficiary and cannot be deactivated"
                )));
            }
            beneficiaries::deactivate(gateway_id, &mut tx).await?
        } else {
            beneficiaries::deactivate_all(&mut tx).await?;
            beneficiaries::activate(gateway_id, &mut tx).await?
        };
        tx.commit().await?;
        info!("🗃️ Beneficiary [{gateway_id}] is now {}", if result.is_active { "active" } else { "inactive" });
        Ok(result)
    }

    async fn delete_beneficiary(&self, gateway_id: &str) -> Result<Beneficiary, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let target = beneficiaries::fetch_by_gateway_id(gateway_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::BeneficiaryNotFound(gateway_id.to_string()))?;
        if target.is_active {
            return Err(LedgerError::Conflict(format!(
                "Beneficiary [{gateway_id}] is the active payout destination and cannot be deleted"
            )));
        }
        let deleted = beneficiaries::delete(gateway_id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

impl AuditManagement for SqliteDatabase {
    async fn append_activity(&self, entry: NewActivityEntry) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        audit::insert_activity(entry, &mut conn).await
    }

    async fn fetch_activity_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<ActivityEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        audit::fetch_activity_for_entity(entity_type, entity_id, &mut conn).await
    }
}
