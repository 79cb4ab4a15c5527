use rust_decimal::Decimal;
use thiserror::Error;

use crate::atobarai::AtobaraiApiError;

/// Errors out of the refund orchestration.
///
/// `NoMatchingStrategy`, `MissingFulfillmentContext` and `AmountOutOfRange`
/// are fatal: retrying the same delivery gives the same answer.
/// `PartnerApi` may succeed on a later delivery.
#[derive(Debug, Error)]
pub enum RefundError {
    #[error("no matching refund strategy for psp reference {psp_reference}")]
    NoMatchingStrategy { psp_reference: String },
    #[error("refund after fulfillment for psp reference {psp_reference} is missing {field}")]
    MissingFulfillmentContext {
        field: &'static str,
        psp_reference: String,
    },
    #[error("amount {amount} cannot be expressed in yen")]
    AmountOutOfRange { amount: Decimal },
    #[error(transparent)]
    PartnerApi(#[from] AtobaraiApiError),
}

impl RefundError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PartnerApi(_))
    }
}
