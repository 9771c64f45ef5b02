use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Donation, DonationStatus, NewDonation, TransactionRef},
    traits::LedgerError,
};

/// Inserts the donation into the database, returning `false` in the second parameter if a donation with the
/// same transaction reference already exists.
pub async fn idempotent_insert(
    donation: NewDonation,
    conn: &mut SqliteConnection,
) -> Result<(Donation, bool), LedgerError> {
    let inserted = match fetch_donation_by_reference(&donation.transaction_reference, conn).await? {
        Some(donation) => (donation, false),
        None => {
            let donation = insert_donation(donation, conn).await?;
            debug!(
                "📝️ Donation [{}] inserted with id {} ({})",
                donation.transaction_reference, donation.id, donation.status
            );
            (donation, true)
        },
    };
    Ok(inserted)
}

async fn insert_donation(donation: NewDonation, conn: &mut SqliteConnection) -> Result<Donation, LedgerError> {
    let donation = sqlx::query_as(
        r#"
            INSERT INTO donations (
                fund_id,
                amount,
                currency,
                status,
                transaction_reference,
                payment_method,
                is_anonymous,
                is_recurring
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(donation.fund_id)
    .bind(donation.amount)
    .bind(donation.currency)
    .bind(donation.status)
    .bind(donation.transaction_reference)
    .bind(donation.payment_method)
    .bind(donation.is_anonymous)
    .bind(donation.is_recurring)
    .fetch_one(conn)
    .await?;
    Ok(donation)
}

pub async fn fetch_donation_by_reference(
    reference: &TransactionRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, LedgerError> {
    let donation = sqlx::query_as("SELECT * FROM donations WHERE transaction_reference = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(donation)
}

pub async fn fetch_donation_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Donation>, LedgerError> {
    let donation = sqlx::query_as("SELECT * FROM donations WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(donation)
}

pub async fn fetch_donations_for_fund(
    fund_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Donation>, LedgerError> {
    let donations = sqlx::query_as("SELECT * FROM donations WHERE fund_id = $1 ORDER BY created_at ASC")
        .bind(fund_id)
        .fetch_all(conn)
        .await?;
    Ok(donations)
}

/// Flips the donation out of Pending, guarded by the current status in the WHERE clause. Returns `None` when
/// the donation is not currently Pending (already finalized, or no such reference) without mutating anything.
///
/// The guard is what makes concurrent webhook deliveries for the same reference safe: only one of them can
/// match `status = 'Pending'`.
pub async fn transition_from_pending(
    reference: &TransactionRef,
    outcome: DonationStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, LedgerError> {
    let donation: Option<Donation> = sqlx::query_as(
        "UPDATE donations SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE transaction_reference = $2 AND \
         status = 'Pending' RETURNING *",
    )
    .bind(outcome)
    .bind(reference.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(donation)
}

/// Sum of completed donation amounts for a fund. Used by invariant checks, not the hot path.
pub async fn completed_total_for_fund(fund_id: i64, conn: &mut SqliteConnection) -> Result<i64, LedgerError> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0) FROM donations WHERE fund_id = $1 AND status = 'Complete'",
    )
    .bind(fund_id)
    .fetch_one(conn)
    .await?;
    Ok(total)
}
