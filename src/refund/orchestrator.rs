//! Refund orchestrators: classify the event, build the phase context and
//! hand it to exactly one strategy.

use async_trait::async_trait;
use tracing::info;

use super::error::RefundError;
use super::event_parser::ParsedRefundEvent;
use super::policy::{classify, RefundKind};
use super::response::RefundUseCaseResponse;
use super::strategy::{
    after_fulfillment, before_fulfillment, AfterFulfillmentRefundContext,
    AfterFulfillmentRefundStrategy, BeforeFulfillmentRefundContext,
    BeforeFulfillmentRefundStrategy, RecordWriter,
};
use crate::app_config::AppChannelConfig;
use crate::atobarai::{AtobaraiApiClient, AtobaraiTransactionId};
use crate::transactions::{TransactionRecord, TransactionRecordRepo};

pub struct RefundRequest<'a> {
    pub parsed_event: &'a ParsedRefundEvent,
    pub app_config: &'a AppChannelConfig,
    pub atobarai_transaction_id: &'a AtobaraiTransactionId,
    pub api_client: &'a dyn AtobaraiApiClient,
    pub transaction_record: &'a TransactionRecord,
    /// When set, strategies write the record's new state here.
    pub record_repo: Option<&'a dyn TransactionRecordRepo>,
}

impl<'a> RefundRequest<'a> {
    fn record_writer(&self) -> RecordWriter<'a> {
        RecordWriter {
            record: self.transaction_record,
            repo: self.record_repo,
        }
    }
}

#[async_trait]
pub trait RefundOrchestrator: Send + Sync {
    /// Runs the single strategy matching the event. The strategy's result is
    /// returned unchanged.
    async fn process_refund(
        &self,
        request: RefundRequest<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError>;
}

pub struct BeforeFulfillmentRefundOrchestrator;

impl BeforeFulfillmentRefundOrchestrator {
    fn select_strategy(kind: RefundKind) -> &'static dyn BeforeFulfillmentRefundStrategy {
        match kind {
            RefundKind::Full => &before_fulfillment::FullRefund,
            RefundKind::PartialWithLineItems => &before_fulfillment::PartialRefundWithLineItems,
            RefundKind::PartialWithoutLineItems => {
                &before_fulfillment::PartialRefundWithoutLineItems
            }
        }
    }
}

#[async_trait]
impl RefundOrchestrator for BeforeFulfillmentRefundOrchestrator {
    async fn process_refund(
        &self,
        request: RefundRequest<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError> {
        let kind = classify(request.parsed_event)?;

        info!(
            "Refund {} before fulfillment classified as {:?}",
            request.parsed_event.psp_reference, kind
        );

        let context = BeforeFulfillmentRefundContext {
            parsed_event: request.parsed_event,
            app_config: request.app_config,
            atobarai_transaction_id: request.atobarai_transaction_id,
            api_client: request.api_client,
            record: request.record_writer(),
        };

        Self::select_strategy(kind).execute(&context).await
    }
}

pub struct AfterFulfillmentRefundOrchestrator;

impl AfterFulfillmentRefundOrchestrator {
    fn select_strategy(kind: RefundKind) -> &'static dyn AfterFulfillmentRefundStrategy {
        match kind {
            RefundKind::Full => &after_fulfillment::FullRefund,
            RefundKind::PartialWithLineItems => &after_fulfillment::PartialRefundWithLineItems,
            RefundKind::PartialWithoutLineItems => {
                &after_fulfillment::PartialRefundWithoutLineItems
            }
        }
    }
}

#[async_trait]
impl RefundOrchestrator for AfterFulfillmentRefundOrchestrator {
    async fn process_refund(
        &self,
        request: RefundRequest<'_>,
    ) -> Result<RefundUseCaseResponse, RefundError> {
        let kind = classify(request.parsed_event)?;
        let psp_reference = &request.parsed_event.psp_reference;

        info!(
            "Refund {} after fulfillment classified as {:?}",
            psp_reference, kind
        );

        let tracking_number = request
            .transaction_record
            .saleor_tracking_number
            .as_deref()
            .ok_or_else(|| RefundError::MissingFulfillmentContext {
                field: "tracking_number",
                psp_reference: psp_reference.clone(),
            })?;
        let shipping_company_code = request
            .app_config
            .shipping_company_code
            .as_ref()
            .ok_or_else(|| RefundError::MissingFulfillmentContext {
                field: "shipping_company_code",
                psp_reference: psp_reference.clone(),
            })?;

        let context = AfterFulfillmentRefundContext {
            parsed_event: request.parsed_event,
            app_config: request.app_config,
            atobarai_transaction_id: request.atobarai_transaction_id,
            api_client: request.api_client,
            record: request.record_writer(),
            tracking_number,
            shipping_company_code,
        };

        Self::select_strategy(kind).execute(&context).await
    }
}
