use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::LedgerError,
};

pub async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, LedgerError> {
    let withdrawal = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (fund_id, amount, currency, reason, reference, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(withdrawal.fund_id)
    .bind(withdrawal.amount)
    .bind(withdrawal.currency)
    .bind(withdrawal.reason)
    .bind(withdrawal.reference)
    .bind(withdrawal.created_by)
    .fetch_one(conn)
    .await?;
    Ok(withdrawal)
}

pub async fn fetch_withdrawal(id: i64, conn: &mut SqliteConnection) -> Result<Option<Withdrawal>, LedgerError> {
    let withdrawal = sqlx::query_as("SELECT * FROM withdrawals WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(withdrawal)
}

pub async fn fetch_withdrawals(conn: &mut SqliteConnection) -> Result<Vec<Withdrawal>, LedgerError> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals ORDER BY created_at ASC").fetch_all(conn).await?;
    Ok(withdrawals)
}

pub async fn fetch_withdrawals_for_fund(
    fund_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, LedgerError> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE fund_id = $1 ORDER BY created_at ASC")
        .bind(fund_id)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}

/// Removes the row. The fund debit stays in place; see [`crate::traits::DonationLedgerDatabase::delete_withdrawal`].
pub async fn delete_withdrawal(id: i64, conn: &mut SqliteConnection) -> Result<Withdrawal, LedgerError> {
    let withdrawal: Option<Withdrawal> =
        sqlx::query_as("DELETE FROM withdrawals WHERE id = $1 RETURNING *").bind(id).fetch_optional(conn).await?;
    withdrawal.ok_or(LedgerError::WithdrawalNotFound(id))
}

/// Sum of withdrawal amounts for a fund. Used by invariant checks, not the hot path.
pub async fn total_for_fund(fund_id: i64, conn: &mut SqliteConnection) -> Result<i64, LedgerError> {
    let (total,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE fund_id = $1")
            .bind(fund_id)
            .fetch_one(conn)
            .await?;
    Ok(total)
}
