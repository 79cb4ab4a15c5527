//! Refunds on transactions whose shipment NP Atobarai already knows about.
//!
//! A partial change resets the shipment on NP's side, so the partial
//! strategies report the fulfillment again with the stored tracking number.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{
    cancel, change, reauthorization_failure, remaining_billed_amount, remaining_goods,
    AfterFulfillmentRefundContext, AfterFulfillmentRefundStrategy,
};
use crate::atobarai::{AuthorizationResult, Goods, ReportFulfillmentPayload};
use crate::refund::error::RefundError;
use crate::refund::response::RefundUseCaseResponse;
use crate::transactions::TransactionStatus;

/// Cancels the whole NP Atobarai transaction.
pub struct FullRefund;

/// Changes the transaction to the remaining goods, then re-reports the shipment.
pub struct PartialRefundWithLineItems;

/// Changes the billed amount only, then re-reports the shipment.
pub struct PartialRefundWithoutLineItems;

#[async_trait]
impl AfterFulfillmentRefundStrategy for FullRefund {
    async fn execute(
        &self,
        context: &AfterFulfillmentRefundContext<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError> {
        let response = cancel(
            context.api_client,
            context.atobarai_transaction_id,
            context.parsed_event,
        )
        .await?;
        context.record.cancelled().await;
        Ok(response)
    }
}

#[async_trait]
impl AfterFulfillmentRefundStrategy for PartialRefundWithLineItems {
    async fn execute(
        &self,
        context: &AfterFulfillmentRefundContext<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError> {
        let (remaining, billed_amount) = remaining_billed_amount(context.parsed_event)?;
        let goods = remaining_goods(context.parsed_event, context.app_config, billed_amount)?;
        change_and_report(context, remaining, billed_amount, Some(goods)).await
    }
}

#[async_trait]
impl AfterFulfillmentRefundStrategy for PartialRefundWithoutLineItems {
    async fn execute(
        &self,
        context: &AfterFulfillmentRefundContext<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError> {
        let (remaining, billed_amount) = remaining_billed_amount(context.parsed_event)?;
        change_and_report(context, remaining, billed_amount, None).await
    }
}

async fn change_and_report(
    context: &AfterFulfillmentRefundContext<'_>,
    remaining: Decimal,
    billed_amount: i64,
    goods: Option<Vec<Goods>>,
) -> Result<RefundUseCaseResponse, RefundError> {
    let event = context.parsed_event;

    let result: AuthorizationResult = change(
        context.api_client,
        context.atobarai_transaction_id,
        billed_amount,
        goods,
    )
    .await?;

    if let Some(failure) = reauthorization_failure(&result, event) {
        return Ok(failure);
    }

    let report = ReportFulfillmentPayload {
        np_transaction_id: result.np_transaction_id.clone(),
        pd_company_code: context.shipping_company_code.clone(),
        slip_no: context.tracking_number.to_string(),
    };

    if let Err(e) = context.api_client.report_fulfillment(&report).await {
        // NP already holds the new amount; record it before surfacing the error.
        warn!(
            "Transaction {} changed but shipment report failed: {}",
            result.np_transaction_id, e
        );
        context
            .record
            .billed(TransactionStatus::Changed, remaining)
            .await;
        return Err(e.into());
    }

    info!(
        "Transaction {} changed to {} and shipment {} re-reported",
        result.np_transaction_id, billed_amount, context.tracking_number
    );
    context
        .record
        .billed(TransactionStatus::Fulfilled, remaining)
        .await;

    Ok(RefundUseCaseResponse::Success {
        psp_reference: result.np_transaction_id,
        amount: event.refunded_amount,
    })
}
