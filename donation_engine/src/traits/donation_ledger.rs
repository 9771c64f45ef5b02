use cpg_common::Money;

use crate::{
    db_types::{Donation, DonationStatus, NewDonation, NewWithdrawal, TransactionRef, Withdrawal},
    traits::{FinalizeDonationResult, LedgerError},
};

/// This trait defines the highest level of behaviour for backends supporting the donation engine.
///
/// This behaviour includes:
/// * Recording donation attempts (pending or failed) idempotently by transaction reference.
/// * The webhook finalization flow: transitioning a Pending donation to a terminal state and, on completion,
///   crediting the fund in the same atomic unit of work.
/// * Creating withdrawals atomically with the balance check and debit.
#[allow(async_fn_in_trait)]
pub trait DonationLedgerDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts the donation, returning `false` in the second tuple element if a donation with the same
    /// transaction reference already exists (in which case the existing row is returned unchanged).
    async fn insert_donation(&self, donation: NewDonation) -> Result<(Donation, bool), LedgerError>;

    /// Transitions the donation with the given reference out of Pending, at most once.
    ///
    /// In a single atomic transaction:
    /// * the status flips to `outcome` only if the current status is Pending;
    /// * if `outcome` is Complete, the fund is credited with the donation amount.
    ///
    /// A crash can therefore never leave a completed donation without its credit, or vice versa. Calling this
    /// again for the same reference (duplicate webhook delivery, concurrent delivery, contradicting later
    /// event) returns [`FinalizeDonationResult::AlreadyFinalized`] and mutates nothing.
    ///
    /// `outcome` must be a terminal status; passing Pending is a validation error.
    async fn finalize_donation(
        &self,
        reference: &TransactionRef,
        outcome: DonationStatus,
    ) -> Result<FinalizeDonationResult, LedgerError>;

    async fn fetch_donation_by_reference(&self, reference: &TransactionRef) -> Result<Option<Donation>, LedgerError>;

    async fn fetch_donation_by_id(&self, id: i64) -> Result<Option<Donation>, LedgerError>;

    async fn fetch_donations_for_fund(&self, fund_id: i64) -> Result<Vec<Donation>, LedgerError>;

    /// Creates a withdrawal. In a single atomic transaction:
    /// * the fund balance is checked against the requested amount and debited;
    /// * the withdrawal row is inserted.
    ///
    /// If the balance is insufficient the transaction aborts with
    /// [`LedgerError::InsufficientFunds`] quoting available vs requested, and no row is created.
    /// Returns the withdrawal and the balance remaining immediately after the debit.
    async fn create_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<(Withdrawal, Money), LedgerError>;

    /// Deletes the withdrawal row. The fund debit is NOT reversed. This is a correction for rows created in
    /// error moments earlier, not a refund mechanism.
    async fn delete_withdrawal(&self, id: i64) -> Result<Withdrawal, LedgerError>;

    async fn fetch_withdrawals_for_fund(&self, fund_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;

    async fn fetch_withdrawals(&self) -> Result<Vec<Withdrawal>, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}
