use std::fmt::Debug;

use log::*;
use serde_json::json;

use crate::{
    api::audit::AuditLogger,
    db_types::{NewActivityEntry, NewWithdrawal, Withdrawal},
    traits::{DonationLedgerDatabase, FundManagement, LedgerError},
};

/// Request-level context for the audit trail: who triggered the operation and from where.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

pub struct WithdrawalApi<B> {
    db: B,
    audit: AuditLogger,
}

impl<B> Debug for WithdrawalApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawalApi")
    }
}

impl<B> WithdrawalApi<B>
where B: DonationLedgerDatabase + FundManagement
{
    pub fn new(db: B, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    /// Creates a withdrawal. The balance check, the debit and the row insert are one atomic unit inside the
    /// backend; an insufficient balance surfaces as [`LedgerError::InsufficientFunds`] quoting available vs
    /// requested, with no row created and no balance change.
    ///
    /// The audit entry snapshots the remaining balance at the moment of the debit. It is a point-in-time
    /// value, not derivable later, because the balance can change again immediately.
    pub async fn create(&self, withdrawal: NewWithdrawal, ctx: AuditContext) -> Result<Withdrawal, LedgerError> {
        let fund_id = withdrawal.fund_id;
        // Distinguish "no such fund" from "not enough money" up front so callers get a 404, not a 400.
        let _fund = self.db.fetch_fund(fund_id).await?.ok_or(LedgerError::FundNotFound(fund_id))?;
        let actor = withdrawal.created_by.clone();
        let (withdrawal, remaining) = self.db.create_withdrawal(withdrawal).await?;
        info!(
            "🔄️🏧️ Withdrawal #{} of {} from fund #{fund_id} by {actor}. Remaining balance: {remaining}",
            withdrawal.id, withdrawal.amount
        );
        self.audit.append(
            NewActivityEntry::new(
                actor,
                "withdrawal.create".to_string(),
                "withdrawal".to_string(),
                withdrawal.id.to_string(),
                json!({
                    "fund_id": fund_id,
                    "amount": withdrawal.amount.value(),
                    "currency": withdrawal.currency,
                    "reason": withdrawal.reason,
                    "remaining_balance": remaining.value(),
                }),
            )
            .with_source(ctx.ip, ctx.user_agent),
        );
        Ok(withdrawal)
    }

    /// Deletes the withdrawal record without re-crediting the fund. This is a correction for rows created in
    /// error immediately after creation, not a reversal mechanism; the money already left the ledger.
    pub async fn remove(&self, id: i64, actor: &str, ctx: AuditContext) -> Result<Withdrawal, LedgerError> {
        let withdrawal = self.db.delete_withdrawal(id).await?;
        warn!(
            "🔄️🏧️ Withdrawal #{id} deleted by {actor}. The debit of {} against fund #{} stands.",
            withdrawal.amount, withdrawal.fund_id
        );
        self.audit.append(
            NewActivityEntry::new(
                actor.to_string(),
                "withdrawal.delete".to_string(),
                "withdrawal".to_string(),
                id.to_string(),
                json!({
                    "fund_id": withdrawal.fund_id,
                    "amount": withdrawal.amount.value(),
                    "note": "record removed; fund balance intentionally not restored",
                }),
            )
            .with_source(ctx.ip, ctx.user_agent),
        );
        Ok(withdrawal)
    }

    pub async fn list(&self) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals().await
    }

    pub async fn list_for_fund(&self, fund_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals_for_fund(fund_id).await
    }
}
