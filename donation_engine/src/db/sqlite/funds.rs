use cpg_common::Money;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Fund, NewFund},
    traits::LedgerError,
};

pub async fn insert_fund(fund: NewFund, conn: &mut SqliteConnection) -> Result<Fund, LedgerError> {
    let fund = sqlx::query_as(
        r#"
            INSERT INTO funds (title_en, title_fr, currency)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(fund.title_en)
    .bind(fund.title_fr)
    .bind(fund.currency)
    .fetch_one(conn)
    .await?;
    Ok(fund)
}

pub async fn fetch_fund(id: i64, conn: &mut SqliteConnection) -> Result<Option<Fund>, LedgerError> {
    let fund = sqlx::query_as("SELECT * FROM funds WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(fund)
}

pub async fn fetch_funds(conn: &mut SqliteConnection) -> Result<Vec<Fund>, LedgerError> {
    let funds = sqlx::query_as("SELECT * FROM funds ORDER BY created_at ASC").fetch_all(conn).await?;
    Ok(funds)
}

/// Adds `amount` to the fund balance as a single atomic increment and returns the new balance.
///
/// No application-level read-modify-write: the increment happens entirely inside the UPDATE, so concurrent
/// credits and debits against the same fund serialize at the storage layer.
pub async fn credit(fund_id: i64, amount: Money, conn: &mut SqliteConnection) -> Result<Money, LedgerError> {
    if amount.is_negative() {
        return Err(LedgerError::Validation(format!("Cannot credit a negative amount ({amount})")));
    }
    let new_balance: Option<(Money,)> = sqlx::query_as(
        "UPDATE funds SET current_amount = current_amount + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 \
         RETURNING current_amount",
    )
    .bind(amount)
    .bind(fund_id)
    .fetch_optional(&mut *conn)
    .await?;
    let new_balance = new_balance.ok_or(LedgerError::FundNotFound(fund_id))?.0;
    trace!("💰️ Fund #{fund_id} credited with {amount}. New balance: {new_balance}");
    Ok(new_balance)
}

/// Subtracts `amount` from the fund balance and returns the new balance. The balance check is part of the
/// UPDATE's WHERE clause, so check and decrement are one atomic unit; a concurrent debit can never push the
/// balance negative.
pub async fn debit(fund_id: i64, amount: Money, conn: &mut SqliteConnection) -> Result<Money, LedgerError> {
    if amount.is_negative() {
        return Err(LedgerError::Validation(format!("Cannot debit a negative amount ({amount})")));
    }
    let new_balance: Option<(Money,)> = sqlx::query_as(
        "UPDATE funds SET current_amount = current_amount - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND \
         current_amount >= $1 RETURNING current_amount",
    )
    .bind(amount)
    .bind(fund_id)
    .fetch_optional(&mut *conn)
    .await?;
    match new_balance {
        Some((balance,)) => {
            trace!("💰️ Fund #{fund_id} debited by {amount}. New balance: {balance}");
            Ok(balance)
        },
        // Zero rows matched: either the fund is missing, or the guard rejected the debit.
        None => match fetch_fund(fund_id, conn).await? {
            Some(fund) => {
                Err(LedgerError::InsufficientFunds { available: fund.current_amount, requested: amount })
            },
            None => Err(LedgerError::FundNotFound(fund_id)),
        },
    }
}
