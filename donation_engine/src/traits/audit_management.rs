use crate::{
    db_types::{ActivityEntry, NewActivityEntry},
    traits::LedgerError,
};

/// Append-only activity records. Writes go through the [`crate::AuditLogger`] task so that a failure here can
/// never block or fail the primary operation being audited.
#[allow(async_fn_in_trait)]
pub trait AuditManagement: Clone {
    async fn append_activity(&self, entry: NewActivityEntry) -> Result<(), LedgerError>;

    async fn fetch_activity_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<ActivityEntry>, LedgerError>;
}
