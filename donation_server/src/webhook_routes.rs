//----------------------------------------------   Gateway webhooks  ----------------------------------------------------

use actix_web::{web, HttpResponse};
use donation_engine::{
    traits::PaymentGateway,
    DonationFlowApi,
    LedgerError,
    PaymentNotification,
    WebhookOutcome,
};
use gateway_tools::WebhookPayload;
use log::{debug, info, trace, warn};

use crate::{data_objects::JsonResponse, route, routes::LedgerBackend};

route!(gateway_webhook => Post "/webhook" impl LedgerBackend, PaymentGateway);
/// Receives charge outcome events from the payment gateway.
///
/// The HMAC middleware has already verified the body signature by the time this handler runs. Webhook
/// responses must always be in the 200 range, otherwise the gateway will retry indefinitely; every processed,
/// duplicate, unknown-reference and ignored outcome is therefore a 200 with a descriptive body. Only a
/// backend failure returns a 500, which IS worth a gateway retry.
pub async fn gateway_webhook<B, G>(
    body: web::Json<WebhookPayload>,
    api: web::Data<DonationFlowApi<B, G>>,
) -> HttpResponse
where
    B: LedgerBackend,
    G: PaymentGateway,
{
    let payload = body.into_inner();
    trace!("📬️ Received gateway webhook: {}", payload.event);
    let notification = PaymentNotification {
        event: payload.event,
        reference: payload.data.reference.into(),
        amount: payload.data.amount.into(),
        currency: payload.data.currency,
        status: payload.data.status,
    };
    match api.process_notification(notification).await {
        Ok(WebhookOutcome::Credited { donation_id, fund_id }) => {
            info!("📬️ Donation #{donation_id} completed and fund #{fund_id} credited.");
            HttpResponse::Ok().json(WebhookOutcome::Credited { donation_id, fund_id })
        },
        Ok(WebhookOutcome::MarkedFailed { donation_id }) => {
            info!("📬️ Donation #{donation_id} marked as failed.");
            HttpResponse::Ok().json(WebhookOutcome::MarkedFailed { donation_id })
        },
        Ok(WebhookOutcome::AlreadyFinalized { donation_id }) => {
            debug!("📬️ Duplicate delivery for donation #{donation_id}. Nothing changed.");
            HttpResponse::Ok().json(WebhookOutcome::AlreadyFinalized { donation_id })
        },
        Ok(WebhookOutcome::UnknownReference) => {
            warn!("📬️ Webhook quoted a transaction reference we do not know. Acknowledging anyway.");
            HttpResponse::Ok().json(WebhookOutcome::UnknownReference)
        },
        Ok(WebhookOutcome::Ignored { event }) => {
            debug!("📬️ Ignoring unrecognized gateway event '{event}'.");
            HttpResponse::Ok().json(WebhookOutcome::Ignored { event })
        },
        Err(LedgerError::DatabaseError(e)) => {
            warn!("📬️ Could not process webhook. {e}");
            HttpResponse::InternalServerError().json(JsonResponse::failure("Could not process notification."))
        },
        Err(e) => {
            warn!("📬️ Unexpected error while handling gateway notification. {e}");
            HttpResponse::Ok().json(JsonResponse::failure(e.to_string()))
        },
    }
}
