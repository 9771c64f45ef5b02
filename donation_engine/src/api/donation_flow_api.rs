use std::fmt::Debug;

use cpg_common::Money;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Donation, DonationStatus, NewDonation, PaymentMethod, TransactionRef},
    helpers::local_failure_reference,
    traits::{
        DonationLedgerDatabase,
        FinalizeDonationResult,
        LedgerError,
        FundManagement,
        NewCharge,
        PaymentGateway,
        WebhookOutcome,
    },
};

/// Gateway event names the webhook processor acts on. Anything else is accepted and ignored so that new
/// gateway event types never break the endpoint.
pub const CHARGE_COMPLETED_EVENT: &str = "charge.completed";
pub const CHARGE_FAILED_EVENT: &str = "charge.failed";

/// Donation acceptance rules, built once from server configuration and passed in by reference-holder.
#[derive(Debug, Clone)]
pub struct DonationPolicy {
    pub minimum_amount: Money,
    pub supported_currencies: Vec<String>,
}

impl Default for DonationPolicy {
    fn default() -> Self {
        Self {
            minimum_amount: Money::from(100),
            supported_currencies: vec![cpg_common::XAF_CURRENCY_CODE.to_string()],
        }
    }
}

/// A gateway notification reduced to the fields the ledger cares about. The server converts the gateway's
/// wire payload into this before handing it over; signature verification has already happened by then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub event: String,
    pub reference: TransactionRef,
    pub amount: Money,
    pub currency: String,
    pub status: String,
}

/// What the donor gets back from a successful initiation: the pending donation row and where to pay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatedDonation {
    pub donation: Donation,
    pub payment_url: String,
}

#[derive(Debug, Clone)]
pub struct NewDonationRequest {
    pub fund_id: i64,
    pub amount: Money,
    pub currency: String,
    pub method: PaymentMethod,
    pub is_anonymous: bool,
    pub is_recurring: bool,
}

/// `DonationFlowApi` is the primary API for the donation lifecycle: initiating charges against the gateway
/// and finalizing donations in response to gateway webhook events.
pub struct DonationFlowApi<B, G> {
    db: B,
    gateway: G,
    policy: DonationPolicy,
}

impl<B, G> Debug for DonationFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DonationFlowApi")
    }
}

impl<B, G> DonationFlowApi<B, G>
where
    B: DonationLedgerDatabase + FundManagement,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G, policy: DonationPolicy) -> Self {
        Self { db, gateway, policy }
    }

    pub fn policy(&self) -> &DonationPolicy {
        &self.policy
    }

    /// Initiates a donation.
    ///
    /// The fund must exist and the request must pass the policy checks. The gateway charge is created first,
    /// with no database locks held; only then is the donation row persisted:
    /// * gateway success → a Pending row with the gateway's transaction reference, returned with the payment
    ///   URL;
    /// * gateway failure (after the client's bounded retries) → a Failed row with a locally generated
    ///   reference is still persisted before the error is surfaced. A donation attempt is always recorded.
    ///
    /// Fund balances are untouched either way. Money only moves when the gateway confirms the payment via
    /// webhook.
    pub async fn initiate(&self, request: NewDonationRequest) -> Result<InitiatedDonation, LedgerError> {
        let fund = self
            .db
            .fetch_fund(request.fund_id)
            .await?
            .ok_or(LedgerError::FundNotFound(request.fund_id))?;
        if request.amount < self.policy.minimum_amount {
            return Err(LedgerError::Validation(format!(
                "Donation amount {} is below the minimum of {}",
                request.amount, self.policy.minimum_amount
            )));
        }
        let currency = request.currency.to_uppercase();
        if !self.policy.supported_currencies.iter().any(|c| c.eq_ignore_ascii_case(&currency)) {
            return Err(LedgerError::Validation(format!("Currency {currency} is not supported")));
        }

        let charge = NewCharge::new(request.amount, currency.clone(), request.method)
            .with_description(format!("Donation to {}", fund.title_en));
        let authorization = match self.gateway.create_charge(charge).await {
            Ok(authorization) => authorization,
            Err(e) => {
                warn!("🔄️💳️ Charge creation for fund #{} failed at the gateway. {e}", fund.id);
                let failed = NewDonation::failed(fund.id, request.amount, local_failure_reference())
                    .with_method(request.method)
                    .with_flags(request.is_anonymous, request.is_recurring);
                let (donation, _) = self.db.insert_donation(failed).await?;
                debug!("🔄️💳️ Failed donation attempt recorded as [{}]", donation.transaction_reference);
                return Err(LedgerError::Gateway(e));
            },
        };

        let mut pending = NewDonation::pending(fund.id, request.amount, authorization.reference.clone())
            .with_method(request.method)
            .with_flags(request.is_anonymous, request.is_recurring);
        pending.currency = currency;
        let (donation, inserted) = self.db.insert_donation(pending).await?;
        if !inserted {
            // The gateway handed out a reference we have already seen. Refuse rather than guess.
            return Err(LedgerError::DuplicateReference(authorization.reference.to_string()));
        }
        info!(
            "🔄️💳️ Donation #{} of {} to fund #{} is pending under reference [{}]",
            donation.id, donation.amount, donation.fund_id, donation.transaction_reference
        );
        Ok(InitiatedDonation { donation, payment_url: authorization.payment_url })
    }

    /// Processes a gateway notification, idempotently.
    ///
    /// Replaying the same notification, delivering it concurrently, or delivering a contradicting event for
    /// an already-finalized donation all leave the ledger unchanged; only a Pending donation can transition,
    /// and it does so atomically with the fund credit.
    pub async fn process_notification(&self, notification: PaymentNotification) -> Result<WebhookOutcome, LedgerError> {
        let outcome = match notification.event.as_str() {
            CHARGE_COMPLETED_EVENT => DonationStatus::Complete,
            CHARGE_FAILED_EVENT => DonationStatus::Failed,
            other => {
                debug!("🔄️📦️ Ignoring unrecognised gateway event [{other}]");
                return Ok(WebhookOutcome::Ignored { event: other.to_string() });
            },
        };
        let reference = notification.reference.clone();
        match self.db.finalize_donation(&reference, outcome).await? {
            FinalizeDonationResult::Completed { donation, new_balance } => {
                if donation.amount != notification.amount {
                    warn!(
                        "🔄️📦️ Gateway reported {} for donation [{reference}], but {} was recorded at initiation. \
                         The recorded amount was credited.",
                        notification.amount, donation.amount
                    );
                }
                info!(
                    "🔄️📦️ Donation #{} complete. Fund #{} balance is now {new_balance}",
                    donation.id, donation.fund_id
                );
                Ok(WebhookOutcome::Credited { donation_id: donation.id, fund_id: donation.fund_id })
            },
            FinalizeDonationResult::Failed { donation } => {
                info!("🔄️📦️ Donation #{} marked failed by the gateway", donation.id);
                Ok(WebhookOutcome::MarkedFailed { donation_id: donation.id })
            },
            FinalizeDonationResult::AlreadyFinalized(donation) => {
                debug!(
                    "🔄️📦️ Donation #{} is already {}. Event [{}] had no effect.",
                    donation.id, donation.status, notification.event
                );
                Ok(WebhookOutcome::AlreadyFinalized { donation_id: donation.id })
            },
            FinalizeDonationResult::NotFound => {
                // Foreign or unknown references are tolerated; the gateway may serve several applications.
                warn!("🔄️📦️ No donation matches reference [{reference}]. Ignoring.");
                Ok(WebhookOutcome::UnknownReference)
            },
        }
    }

    pub async fn donation_by_id(&self, id: i64) -> Result<Option<Donation>, LedgerError> {
        self.db.fetch_donation_by_id(id).await
    }

    pub async fn donation_by_reference(&self, reference: &TransactionRef) -> Result<Option<Donation>, LedgerError> {
        self.db.fetch_donation_by_reference(reference).await
    }

    pub async fn donations_for_fund(&self, fund_id: i64) -> Result<Vec<Donation>, LedgerError> {
        self.db.fetch_donations_for_fund(fund_id).await
    }
}
