use crate::transactions::TransactionRecord;

use super::orchestrator::{
    AfterFulfillmentRefundOrchestrator, BeforeFulfillmentRefundOrchestrator, RefundOrchestrator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentPhase {
    BeforeFulfillment,
    AfterFulfillment,
}

impl FulfillmentPhase {
    /// A transaction is fulfilled once its shipment was reported to NP Atobarai.
    pub fn of(record: &TransactionRecord) -> Self {
        if record.is_fulfilled() {
            Self::AfterFulfillment
        } else {
            Self::BeforeFulfillment
        }
    }

    pub fn orchestrator(self) -> &'static dyn RefundOrchestrator {
        match self {
            Self::BeforeFulfillment => &BeforeFulfillmentRefundOrchestrator,
            Self::AfterFulfillment => &AfterFulfillmentRefundOrchestrator,
        }
    }
}
