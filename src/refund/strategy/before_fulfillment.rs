//! Refunds on transactions whose shipment has not been reported yet. NP
//! Atobarai still accepts plain changes and cancellations here.

use async_trait::async_trait;

use super::{
    cancel, change, reauthorization_failure, remaining_billed_amount, remaining_goods,
    BeforeFulfillmentRefundContext, BeforeFulfillmentRefundStrategy,
};
use crate::refund::error::RefundError;
use crate::refund::response::RefundUseCaseResponse;
use crate::transactions::TransactionStatus;

/// Cancels the whole NP Atobarai transaction.
pub struct FullRefund;

/// Changes the transaction to the goods left after the granted refund lines.
pub struct PartialRefundWithLineItems;

/// Changes the transaction's billed amount only.
pub struct PartialRefundWithoutLineItems;

#[async_trait]
impl BeforeFulfillmentRefundStrategy for FullRefund {
    async fn execute(
        &self,
        context: &BeforeFulfillmentRefundContext<'_>,
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
impl BeforeFulfillmentRefundStrategy for PartialRefundWithLineItems {
    async fn execute(
        &self,
        context: &BeforeFulfillmentRefundContext<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError> {
        let event = context.parsed_event;
        let (remaining, billed_amount) = remaining_billed_amount(event)?;
        let goods = remaining_goods(event, context.app_config, billed_amount)?;

        let result = change(
            context.api_client,
            context.atobarai_transaction_id,
            billed_amount,
            Some(goods),
        )
        .await?;

        if let Some(failure) = reauthorization_failure(&result, event) {
            return Ok(failure);
        }

        context
            .record
            .billed(TransactionStatus::Changed, remaining)
            .await;

        Ok(RefundUseCaseResponse::Success {
            psp_reference: result.np_transaction_id,
            amount: event.refunded_amount,
        })
    }
}

#[async_trait]
impl BeforeFulfillmentRefundStrategy for PartialRefundWithoutLineItems {
    async fn execute(
        &self,
        context: &BeforeFulfillmentRefundContext<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError> {
        let event = context.parsed_event;
        let (remaining, billed_amount) = remaining_billed_amount(event)?;

        let result = change(
            context.api_client,
            context.atobarai_transaction_id,
            billed_amount,
            None,
        )
        .await?;

        if let Some(failure) = reauthorization_failure(&result, event) {
            return Ok(failure);
        }

        context
            .record
            .billed(TransactionStatus::Changed, remaining)
            .await;

        Ok(RefundUseCaseResponse::Success {
            psp_reference: result.np_transaction_id,
            amount: event.refunded_amount,
        })
    }
}
