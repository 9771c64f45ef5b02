use cpg_common::Money;

use crate::{
    db_types::{Fund, NewFund},
    traits::LedgerError,
};

/// Fund rows and the balance column. The balance is only ever mutated through [`Self::credit_fund`] and
/// [`Self::debit_fund`]; both are guarded atomic updates at the storage layer, so concurrent mutations of the
/// same fund serialize without any application-level read-modify-write.
#[allow(async_fn_in_trait)]
pub trait FundManagement: Clone {
    async fn create_fund(&self, fund: NewFund) -> Result<Fund, LedgerError>;

    async fn fetch_fund(&self, id: i64) -> Result<Option<Fund>, LedgerError>;

    async fn fetch_funds(&self) -> Result<Vec<Fund>, LedgerError>;

    /// Adds `amount` to the fund balance and returns the new balance.
    async fn credit_fund(&self, fund_id: i64, amount: Money) -> Result<Money, LedgerError>;

    /// Subtracts `amount` from the fund balance and returns the new balance. The `balance >= amount` check and
    /// the decrement are one atomic unit; on insufficient funds nothing changes and
    /// [`LedgerError::InsufficientFunds`] is returned with the available amount at the time of the attempt.
    async fn debit_fund(&self, fund_id: i64, amount: Money) -> Result<Money, LedgerError>;
}
