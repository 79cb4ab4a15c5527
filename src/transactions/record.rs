use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::atobarai::AtobaraiTransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Registered,
    /// NP Atobarai is still reviewing the registration (`10` or `40`).
    UnderReview,
    Fulfilled,
    Changed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::UnderReview => "under_review",
            Self::Fulfilled => "fulfilled",
            Self::Changed => "changed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "under_review" => Ok(Self::UnderReview),
            "fulfilled" => Ok(Self::Fulfilled),
            "changed" => Ok(Self::Changed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// Link between a Saleor transaction and the NP Atobarai transaction backing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub saleor_transaction_id: String,
    pub atobarai_transaction_id: AtobaraiTransactionId,
    /// Set once the fulfillment was reported to NP Atobarai.
    pub saleor_tracking_number: Option<String>,
    pub status: TransactionStatus,
    pub billed_amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn registered(
        saleor_transaction_id: impl Into<String>,
        atobarai_transaction_id: AtobaraiTransactionId,
        billed_amount: Decimal,
    ) -> Self {
        Self {
            saleor_transaction_id: saleor_transaction_id.into(),
            atobarai_transaction_id,
            saleor_tracking_number: None,
            status: TransactionStatus::Registered,
            billed_amount,
            updated_at: Utc::now(),
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.saleor_tracking_number.is_some()
    }

    #[cfg(test)]
    pub fn with_fulfillment(&self, tracking_number: impl Into<String>) -> Self {
        Self {
            saleor_tracking_number: Some(tracking_number.into()),
            status: TransactionStatus::Fulfilled,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfillment_keeps_partner_id_and_amount() {
        let record = TransactionRecord::registered(
            "saleor-1",
            AtobaraiTransactionId::new("np-1"),
            Decimal::new(1000, 0),
        );
        assert!(!record.is_fulfilled());

        let fulfilled = record.with_fulfillment("TRACK-1");
        assert!(fulfilled.is_fulfilled());
        assert_eq!(fulfilled.status, TransactionStatus::Fulfilled);
        assert_eq!(fulfilled.atobarai_transaction_id, record.atobarai_transaction_id);
        assert_eq!(fulfilled.billed_amount, record.billed_amount);
    }

    #[test]
    fn status_text_round_trips() {
        for status in [
            TransactionStatus::Registered,
            TransactionStatus::UnderReview,
            TransactionStatus::Fulfilled,
            TransactionStatus::Changed,
            TransactionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
        assert!("refunded".parse::<TransactionStatus>().is_err());
    }
}
