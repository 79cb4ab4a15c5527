use rust_decimal::Decimal;

use crate::atobarai::AtobaraiTransactionId;
use crate::models::{TransactionResultCode, TransactionWebhookResponse};

/// Outcome of a refund the partner answered. Transport and HTTP failures are
/// `RefundError::PartnerApi` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum RefundUseCaseResponse {
    Success {
        psp_reference: AtobaraiTransactionId,
        amount: Decimal,
    },
    /// NP Atobarai processed the request but did not re-authorize the new amount.
    Failure {
        psp_reference: AtobaraiTransactionId,
        amount: Decimal,
        message: String,
    },
}

impl RefundUseCaseResponse {
    pub fn to_webhook_response(&self) -> TransactionWebhookResponse {
        match self {
            Self::Success {
                psp_reference,
                amount,
            } => TransactionWebhookResponse {
                psp_reference: Some(psp_reference.to_string()),
                result: TransactionResultCode::RefundSuccess,
                amount: *amount,
                message: None,
            },
            Self::Failure {
                psp_reference,
                amount,
                message,
            } => TransactionWebhookResponse {
                psp_reference: Some(psp_reference.to_string()),
                result: TransactionResultCode::RefundFailure,
                amount: *amount,
                message: Some(message.clone()),
            },
        }
    }
}
