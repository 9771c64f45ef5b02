use std::fmt::Debug;

use serde_json::json;

use crate::{
    api::{audit::AuditLogger, withdrawal_api::AuditContext},
    db_types::{Fund, NewActivityEntry, NewFund},
    traits::{FundManagement, LedgerError},
};

pub struct FundApi<B> {
    db: B,
    audit: AuditLogger,
}

impl<B> Debug for FundApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FundApi")
    }
}

impl<B> FundApi<B>
where B: FundManagement
{
    pub fn new(db: B, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    pub async fn create(&self, fund: NewFund, actor: &str, ctx: AuditContext) -> Result<Fund, LedgerError> {
        if fund.title_en.trim().is_empty() && fund.title_fr.trim().is_empty() {
            return Err(LedgerError::Validation("A fund needs a title in at least one language".to_string()));
        }
        let fund = self.db.create_fund(fund).await?;
        self.audit.append(
            NewActivityEntry::new(
                actor.to_string(),
                "fund.create".to_string(),
                "fund".to_string(),
                fund.id.to_string(),
                json!({ "title_en": fund.title_en, "currency": fund.currency }),
            )
            .with_source(ctx.ip, ctx.user_agent),
        );
        Ok(fund)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Fund>, LedgerError> {
        self.db.fetch_fund(id).await
    }

    pub async fn list(&self) -> Result<Vec<Fund>, LedgerError> {
        self.db.fetch_funds().await
    }
}
