//! `FULFILLMENT_TRACKING_NUMBER_UPDATED`: report the shipment of every NP
//! Atobarai transaction on the order. Once reported, refunds on that
//! transaction go through the after-fulfillment orchestrator.

use tracing::{debug, info};

use super::channel_config;
use crate::atobarai::ReportFulfillmentPayload;
use crate::error::ApiError;
use crate::models::{FulfillmentReportResponse, FulfillmentTrackingNumberUpdatedPayload};
use crate::state::AppState;
use crate::transactions::TransactionStatus;

pub async fn handle(
    state: &AppState,
    payload: &FulfillmentTrackingNumberUpdatedPayload,
) -> Result<FulfillmentReportResponse, ApiError> {
    let order = payload
        .order
        .as_ref()
        .ok_or(ApiError::InvalidPayload("fulfillment event has no order"))?;

    let Some(tracking_number) = payload
        .fulfillment
        .as_ref()
        .and_then(|f| f.tracking_number.as_deref())
        .filter(|number| !number.is_empty())
    else {
        info!("Order {} fulfillment has no tracking number yet", order.id);
        return Ok(FulfillmentReportResponse { reported: vec![] });
    };

    let config = channel_config(state, &order.channel.slug).await?;
    let shipping_company_code = config
        .shipping_company_code
        .clone()
        .ok_or_else(|| ApiError::MissingShippingCompanyCode(config.channel_slug.clone()))?;
    let api_client = state.api_clients.create(&config.credentials);

    let mut reported = Vec::new();
    for transaction in &order.transactions {
        let Some(record) = state
            .transaction_records
            .get_by_saleor_transaction_id(&transaction.id)
            .await?
        else {
            debug!("Transaction {} is not an NP Atobarai transaction", transaction.id);
            continue;
        };

        if record.status == TransactionStatus::Cancelled
            || record.saleor_tracking_number.as_deref() == Some(tracking_number)
        {
            debug!(
                "Skipping {} ({}, tracking {:?})",
                record.atobarai_transaction_id, record.status, record.saleor_tracking_number
            );
            continue;
        }

        let report = ReportFulfillmentPayload {
            np_transaction_id: record.atobarai_transaction_id.clone(),
            pd_company_code: shipping_company_code.clone(),
            slip_no: tracking_number.to_string(),
        };
        api_client.report_fulfillment(&report).await?;

        state
            .transaction_records
            .update_fulfillment(&record.saleor_transaction_id, tracking_number)
            .await?;

        info!(
            "Shipment {} reported for {}",
            tracking_number, record.atobarai_transaction_id
        );
        reported.push(record.atobarai_transaction_id.to_string());
    }

    Ok(FulfillmentReportResponse { reported })
}
