use std::fmt::Debug;

use log::*;
use serde_json::json;

use crate::{
    api::{audit::AuditLogger, withdrawal_api::AuditContext},
    db_types::{Beneficiary, NewActivityEntry, NewBeneficiary, UpdateBeneficiary},
    traits::{BeneficiaryManagement, LedgerError, PaymentGateway},
};

/// Payout destinations. The gateway is the source of truth for a beneficiary's existence; local rows mirror
/// it. Create and delete therefore talk to the gateway first, and [`Self::sync_from_gateway`] can backfill
/// rows that exist on the gateway but not locally.
pub struct BeneficiaryApi<B, G> {
    db: B,
    gateway: G,
    audit: AuditLogger,
}

impl<B, G> Debug for BeneficiaryApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BeneficiaryApi")
    }
}

impl<B, G> BeneficiaryApi<B, G>
where
    B: BeneficiaryManagement,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G, audit: AuditLogger) -> Self {
        Self { db, gateway, audit }
    }

    /// Registers the beneficiary on the gateway, then mirrors it locally. `details.gateway_id` is ignored on
    /// input; the gateway assigns it.
    pub async fn create(
        &self,
        mut details: NewBeneficiary,
        actor: &str,
        ctx: AuditContext,
    ) -> Result<Beneficiary, LedgerError> {
        let gateway_id = self.gateway.register_beneficiary(&details).await?;
        details.gateway_id = gateway_id.clone();
        let (beneficiary, inserted) = self.db.insert_beneficiary(details).await?;
        if !inserted {
            debug!("🔄️🤝️ Beneficiary [{gateway_id}] already mirrored locally");
        }
        self.audit.append(
            NewActivityEntry::new(
                actor.to_string(),
                "beneficiary.create".to_string(),
                "beneficiary".to_string(),
                beneficiary.gateway_id.clone(),
                json!({ "name": beneficiary.name, "provider": beneficiary.provider }),
            )
            .with_source(ctx.ip, ctx.user_agent),
        );
        Ok(beneficiary)
    }

    pub async fn list(&self) -> Result<Vec<Beneficiary>, LedgerError> {
        self.db.fetch_beneficiaries().await
    }

    pub async fn get(&self, gateway_id: &str) -> Result<Option<Beneficiary>, LedgerError> {
        self.db.fetch_beneficiary(gateway_id).await
    }

    pub async fn active(&self) -> Result<Option<Beneficiary>, LedgerError> {
        self.db.fetch_active_beneficiary().await
    }

    pub async fn update(
        &self,
        gateway_id: &str,
        update: UpdateBeneficiary,
        actor: &str,
        ctx: AuditContext,
    ) -> Result<Beneficiary, LedgerError> {
        let beneficiary = self.db.update_beneficiary(gateway_id, update).await?;
        self.audit.append(
            NewActivityEntry::new(
                actor.to_string(),
                "beneficiary.update".to_string(),
                "beneficiary".to_string(),
                gateway_id.to_string(),
                json!({ "name": beneficiary.name }),
            )
            .with_source(ctx.ip, ctx.user_agent),
        );
        Ok(beneficiary)
    }

    /// Flips the active payout destination. Activating an inactive beneficiary deactivates every other row in
    /// the same transaction; deactivating the only active one is a conflict.
    pub async fn toggle(&self, gateway_id: &str, actor: &str, ctx: AuditContext) -> Result<Beneficiary, LedgerError> {
        let beneficiary = self.db.toggle_beneficiary(gateway_id).await?;
        self.audit.append(
            NewActivityEntry::new(
                actor.to_string(),
                "beneficiary.toggle".to_string(),
                "beneficiary".to_string(),
                gateway_id.to_string(),
                json!({ "is_active": beneficiary.is_active }),
            )
            .with_source(ctx.ip, ctx.user_agent),
        );
        Ok(beneficiary)
    }

    /// Removes the beneficiary from the gateway, then locally. The active beneficiary cannot be deleted; that
    /// check runs first so the gateway is never asked to remove a destination we would refuse to drop.
    pub async fn delete(&self, gateway_id: &str, actor: &str, ctx: AuditContext) -> Result<Beneficiary, LedgerError> {
        let target = self
            .db
            .fetch_beneficiary(gateway_id)
            .await?
            .ok_or_else(|| LedgerError::BeneficiaryNotFound(gateway_id.to_string()))?;
        if target.is_active {
            return Err(LedgerError::Conflict(format!(
                "Beneficiary [{gateway_id}] is the active payout destination and cannot be deleted"
            )));
        }
        self.gateway.remove_beneficiary(gateway_id).await?;
        let beneficiary = self.db.delete_beneficiary(gateway_id).await?;
        self.audit.append(
            NewActivityEntry::new(
                actor.to_string(),
                "beneficiary.delete".to_string(),
                "beneficiary".to_string(),
                gateway_id.to_string(),
                json!({ "name": beneficiary.name }),
            )
            .with_source(ctx.ip, ctx.user_agent),
        );
        Ok(beneficiary)
    }

    /// Inserts every gateway-side beneficiary that is missing locally. Local-only rows are never deleted;
    /// reconciling those is a human decision. Returns the number of rows inserted.
    pub async fn sync_from_gateway(&self, actor: &str, ctx: AuditContext) -> Result<usize, LedgerError> {
        let records = self.gateway.fetch_beneficiaries().await?;
        let mut inserted = 0usize;
        let total = records.len();
        for record in records {
            let (_, was_new) = self.db.insert_beneficiary(NewBeneficiary::from(record)).await?;
            if was_new {
                inserted += 1;
            }
        }
        info!("🔄️🤝️ Beneficiary sync complete. {inserted} of {total} gateway records were new.");
        self.audit.append(
            NewActivityEntry::new(
                actor.to_string(),
                "beneficiary.sync".to_string(),
                "beneficiary".to_string(),
                "*".to_string(),
                json!({ "gateway_records": total, "inserted": inserted }),
            )
            .with_source(ctx.ip, ctx.user_agent),
        );
        Ok(inserted)
    }
}
