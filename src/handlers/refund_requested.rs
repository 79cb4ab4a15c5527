use tracing::{error, info, warn};

use super::channel_config;
use crate::atobarai::AtobaraiTransactionId;
use crate::error::ApiError;
use crate::models::{TransactionRefundRequestedPayload, TransactionResultCode, TransactionWebhookResponse};
use crate::refund::{parse_refund_event, FulfillmentPhase, RefundError, RefundRequest};
use crate::state::AppState;

/// Refund an NP Atobarai transaction.
///
/// 1. Parse the payload into a `ParsedRefundEvent`
/// 2. Load the channel's NP Atobarai configuration
/// 3. Look up the stored record for the NP transaction id (the psp reference)
/// 4. Pick the orchestrator for the record's fulfillment phase and run it
///
/// Partner failures become a `REFUND_FAILURE` body; classification and
/// configuration failures are returned as errors.
pub async fn handle(
    state: &AppState,
    payload: &TransactionRefundRequestedPayload,
) -> Result<TransactionWebhookResponse, ApiError> {
    let event = parse_refund_event(payload)?;
    let config = channel_config(state, &event.channel_slug).await?;

    let atobarai_transaction_id = AtobaraiTransactionId::new(&event.psp_reference);
    let record = state
        .transaction_records
        .get_by_atobarai_transaction_id(&atobarai_transaction_id)
        .await?
        .ok_or_else(|| ApiError::UnknownTransaction(event.psp_reference.clone()))?;

    let phase = FulfillmentPhase::of(&record);
    info!(
        "Refunding {} of {} ({:?})",
        event.refunded_amount, atobarai_transaction_id, phase
    );

    let api_client = state.api_clients.create(&config.credentials);
    let request = RefundRequest {
        parsed_event: &event,
        app_config: &config,
        atobarai_transaction_id: &atobarai_transaction_id,
        api_client: api_client.as_ref(),
        transaction_record: &record,
        record_repo: Some(state.transaction_records.as_ref()),
    };

    match phase.orchestrator().process_refund(request).await {
        Ok(response) => Ok(response.to_webhook_response()),
        Err(RefundError::PartnerApi(e)) => {
            warn!("NP Atobarai refused refund of {}: {}", atobarai_transaction_id, e);
            Ok(TransactionWebhookResponse {
                psp_reference: Some(event.psp_reference),
                result: TransactionResultCode::RefundFailure,
                amount: event.refunded_amount,
                message: Some(e.to_string()),
            })
        }
        Err(e) => {
            error!("Refund of {} cannot be processed: {}", atobarai_transaction_id, e);
            Err(ApiError::Refund(e))
        }
    }
}
