//! Refund strategies, three per fulfillment phase.
//!
//! A strategy issues the partner calls for one kind of refund, records the
//! new state when a record store is supplied, and maps the partner answer
//! into a [`RefundUseCaseResponse`]. Strategies are stateless unit structs.

pub mod after_fulfillment;
pub mod before_fulfillment;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::error::RefundError;
use super::event_parser::ParsedRefundEvent;
use super::response::RefundUseCaseResponse;
use crate::app_config::AppChannelConfig;
use crate::atobarai::goods::{build_goods, to_yen, GoodsLine};
use crate::atobarai::{
    AtobaraiApiClient, AtobaraiTransactionId, AuthorizationResult, AuthorizationStatus,
    CancelTransactionPayload, ChangeTransactionPayload, Goods, ShippingCompanyCode,
};
use crate::transactions::{TransactionRecord, TransactionRecordRepo, TransactionStatus};

pub struct BeforeFulfillmentRefundContext<'a> {
    pub parsed_event: &'a ParsedRefundEvent,
    pub app_config: &'a AppChannelConfig,
    pub atobarai_transaction_id: &'a AtobaraiTransactionId,
    pub api_client: &'a dyn AtobaraiApiClient,
    pub record: RecordWriter<'a>,
}

pub struct AfterFulfillmentRefundContext<'a> {
    pub parsed_event: &'a ParsedRefundEvent,
    pub app_config: &'a AppChannelConfig,
    pub atobarai_transaction_id: &'a AtobaraiTransactionId,
    pub api_client: &'a dyn AtobaraiApiClient,
    pub record: RecordWriter<'a>,
    pub tracking_number: &'a str,
    pub shipping_company_code: &'a ShippingCompanyCode,
}

#[async_trait]
pub trait BeforeFulfillmentRefundStrategy: Send + Sync {
    async fn execute(
        &self,
        context: &BeforeFulfillmentRefundContext<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError>;
}

#[async_trait]
pub trait AfterFulfillmentRefundStrategy: Send + Sync {
    async fn execute(
        &self,
        context: &AfterFulfillmentRefundContext<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError>;
}

/// The record a refund applies to, plus the store to write its new state to.
#[derive(Clone, Copy)]
pub struct RecordWriter<'a> {
    pub record: &'a TransactionRecord,
    pub repo: Option<&'a dyn TransactionRecordRepo>,
}

impl RecordWriter<'_> {
    /// Store the new billing state if a store was supplied. Only status and
    /// amount are written, so a tracking number stored meanwhile survives.
    /// The partner call already happened at this point, so a store failure is
    /// logged, not returned.
    async fn billed(&self, status: TransactionStatus, billed_amount: Decimal) {
        let Some(repo) = self.repo else {
            return;
        };
        let id = &self.record.saleor_transaction_id;
        match repo.update_billing(id, status, billed_amount).await {
            Ok(()) => debug!("Transaction record {} now {} ({})", id, status, billed_amount),
            Err(e) => error!(
                "Failed to update transaction record {} to {}: {}",
                id, status, e
            ),
        }
    }

    async fn cancelled(&self) {
        self.billed(TransactionStatus::Cancelled, Decimal::ZERO).await
    }
}

// ============================================================================
// Shared steps
// ============================================================================

/// Amount still owed by the customer after this refund.
fn remaining_billed_amount(event: &ParsedRefundEvent) -> Result<(Decimal, i64), RefundError> {
    let remaining = event.transaction_total_charged - event.refunded_amount;
    let yen = to_yen(remaining).ok_or(RefundError::AmountOutOfRange { amount: remaining })?;
    Ok((remaining, yen))
}

/// Source lines minus the quantities granted for refund, balanced to `billed_amount`.
fn remaining_goods(
    event: &ParsedRefundEvent,
    config: &AppChannelConfig,
    billed_amount: i64,
) -> Result<Vec<Goods>, RefundError> {
    let granted = event.granted_refund.as_ref();

    let lines = event.source_object_lines.iter().map(|line| {
        let refunded = granted.map_or(0, |g| g.refunded_quantity(&line.id));
        GoodsLine {
            product_name: &line.product_name,
            product_sku: line.product_sku.as_deref(),
            unit_price: line.unit_price,
            quantity: line.quantity.saturating_sub(refunded),
        }
    });

    let shipping_refunded = granted.is_some_and(|g| g.shipping_costs_included);
    let shipping = (!shipping_refunded).then_some(event.shipping_amount);

    build_goods(lines, shipping, billed_amount, config.sku_as_name).ok_or(
        RefundError::AmountOutOfRange {
            amount: event.source_object_total_amount,
        },
    )
}

async fn cancel(
    api_client: &dyn AtobaraiApiClient,
    atobarai_transaction_id: &AtobaraiTransactionId,
    event: &ParsedRefundEvent,
) -> Result<RefundUseCaseResponse, RefundError> {
    let payload = CancelTransactionPayload {
        np_transaction_id: atobarai_transaction_id.clone(),
    };
    let result = api_client.cancel_transaction(&payload).await?;

    info!("NP Atobarai transaction {} cancelled", result.np_transaction_id);

    Ok(RefundUseCaseResponse::Success {
        psp_reference: result.np_transaction_id,
        amount: event.refunded_amount,
    })
}

/// Calls `changeTransaction`, with goods when `goods` is set.
async fn change(
    api_client: &dyn AtobaraiApiClient,
    atobarai_transaction_id: &AtobaraiTransactionId,
    billed_amount: i64,
    goods: Option<Vec<Goods>>,
) -> Result<AuthorizationResult, RefundError> {
    let payload = ChangeTransactionPayload {
        np_transaction_id: atobarai_transaction_id.clone(),
        billed_amount,
        goods,
    };
    Ok(api_client.change_transaction(&payload).await?)
}

/// `None` when NP re-authorized the changed transaction.
fn reauthorization_failure(
    result: &AuthorizationResult,
    event: &ParsedRefundEvent,
) -> Option<RefundUseCaseResponse> {
    if result.authori_result == AuthorizationStatus::Ok {
        return None;
    }

    warn!(
        "NP Atobarai did not re-authorize {}: {:?} {:?}",
        result.np_transaction_id,
        result.authori_result,
        result.reason_codes()
    );

    Some(RefundUseCaseResponse::Failure {
        psp_reference: result.np_transaction_id.clone(),
        amount: event.refunded_amount,
        message: format!(
            "NP Atobarai re-authorization returned {:?} ({})",
            result.authori_result,
            result.reason_codes().join(", ")
        ),
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::refund::policy::tests::{event, yen};

    #[test]
    fn remaining_goods_subtracts_granted_quantities() {
        // L1: 2 x 30, L2: 1 x 40; refunding one L1 leaves 30 + 40 = 70.
        let e = event(yen(30), yen(100), yen(150), Some(vec![("L1", 1)]));
        let goods = remaining_goods(&e, &test_support::app_config(), 70).unwrap();

        assert_eq!(
            goods,
            vec![
                Goods { goods_name: "Green tea".into(), goods_price: 30, quantity: 1 },
                Goods { goods_name: "Tea cup".into(), goods_price: 40, quantity: 1 },
            ]
        );
    }

    #[test]
    fn fully_refunded_lines_are_dropped() {
        let e = event(yen(60), yen(100), yen(150), Some(vec![("L1", 2)]));
        let goods = remaining_goods(&e, &test_support::app_config(), 40).unwrap();
        assert_eq!(goods.len(), 1);
        assert_eq!(goods[0].goods_name, "Tea cup");
    }

    #[test]
    fn remaining_amount_is_charged_minus_refunded() {
        let e = event(yen(30), yen(100), yen(150), None);
        assert_eq!(remaining_billed_amount(&e).unwrap(), (yen(70), 70));
    }

    #[test]
    fn ok_status_is_not_a_failure() {
        let e = event(yen(30), yen(100), yen(150), None);
        assert!(reauthorization_failure(&test_support::authorization(AuthorizationStatus::Ok), &e).is_none());
        assert!(matches!(
            reauthorization_failure(&test_support::authorization(AuthorizationStatus::Ng), &e),
            Some(RefundUseCaseResponse::Failure { message, .. }) if message.contains("NG001")
        ));
    }
}
