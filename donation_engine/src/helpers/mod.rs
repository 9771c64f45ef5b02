use rand::Rng;

use crate::db_types::TransactionRef;

/// A locally generated reference for a donation attempt whose gateway charge never came into existence.
/// The `local-failed-` prefix keeps these visually and lexically distinct from gateway references, and they
/// can never collide with one.
pub fn local_failure_reference() -> TransactionRef {
    let nonce: u64 = rand::thread_rng().gen();
    TransactionRef(format!("local-failed-{nonce:016x}"))
}
