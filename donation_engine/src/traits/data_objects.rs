use cpg_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::Donation;

/// Outcome of [`crate::traits::DonationLedgerDatabase::finalize_donation`]. The variants make the idempotency
/// decision explicit: only a Pending donation can transition, at most once.
#[derive(Debug, Clone)]
pub enum FinalizeDonationResult {
    /// The donation was Pending and the event signalled completion. The fund credit happened in the same
    /// transaction as the status flip; `new_balance` is the balance immediately after the credit.
    Completed { donation: Donation, new_balance: Money },
    /// The donation was Pending and the event signalled failure. No ledger effect.
    Failed { donation: Donation },
    /// The donation was already in a terminal state. Nothing was mutated, whatever the event claimed.
    AlreadyFinalized(Donation),
    /// No donation carries this transaction reference. Unknown and foreign references are tolerated.
    NotFound,
}

/// What the webhook processor did with a notification. Serialized into the webhook HTTP response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum WebhookOutcome {
    Credited { donation_id: i64, fund_id: i64 },
    MarkedFailed { donation_id: i64 },
    AlreadyFinalized { donation_id: i64 },
    UnknownReference,
    Ignored { event: String },
}
