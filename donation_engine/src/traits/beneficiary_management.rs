use crate::{
    db_types::{Beneficiary, NewBeneficiary, UpdateBeneficiary},
    traits::LedgerError,
};

/// Local mirror of the gateway's payout destinations.
///
/// The single-active invariant lives here: at most one row has `is_active = true`, and once any beneficiary
/// exists, exactly one must remain active. The only-active beneficiary can neither be deactivated nor deleted.
#[allow(async_fn_in_trait)]
pub trait BeneficiaryManagement: Clone {
    /// Inserts the beneficiary, returning `false` in the second tuple element if a row with the same gateway
    /// id already exists. The first beneficiary ever inserted becomes active.
    async fn insert_beneficiary(&self, beneficiary: NewBeneficiary) -> Result<(Beneficiary, bool), LedgerError>;

    async fn fetch_beneficiary(&self, gateway_id: &str) -> Result<Option<Beneficiary>, LedgerError>;

    async fn fetch_beneficiaries(&self) -> Result<Vec<Beneficiary>, LedgerError>;

    async fn fetch_active_beneficiary(&self) -> Result<Option<Beneficiary>, LedgerError>;

    async fn update_beneficiary(
        &self,
        gateway_id: &str,
        update: UpdateBeneficiary,
    ) -> Result<Beneficiary, LedgerError>;

    /// Flips the active designation, atomically.
    ///
    /// * Target inactive: every other beneficiary is deactivated and the target activated, in one transaction.
    /// * Target active and it is the only active one: rejected with [`LedgerError::Conflict`].
    /// * Target active with another active row: the target is deactivated. Under the invariant this branch is
    ///   unreachable; it exists as a guard against a corrupted table.
    async fn toggle_beneficiary(&self, gateway_id: &str) -> Result<Beneficiary, LedgerError>;

    /// Deletes the local row. Rejected with [`LedgerError::Conflict`] while the beneficiary is active.
    async fn delete_beneficiary(&self, gateway_id: &str) -> Result<Beneficiary, LedgerError>;
}
