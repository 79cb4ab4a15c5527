//! Normalizes a `TRANSACTION_REFUND_REQUESTED` payload into [`ParsedRefundEvent`].

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{GrantedRefundPayload, SourceObject, TransactionRefundRequestedPayload};

pub const SUPPORTED_CURRENCY: &str = "JPY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefundEventParseError {
    #[error("refund event has no transaction")]
    MissingTransaction,
    #[error("transaction {0} has no psp reference")]
    MissingPspReference(String),
    #[error("transaction {0} has no source object")]
    MissingSourceObject(String),
    #[error("currency {0} is not supported, NP Atobarai settles in JPY only")]
    UnsupportedCurrency(String),
    #[error("granted refund references unknown order line {0}")]
    UnknownLine(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRefundEvent {
    /// NP Atobarai transaction id as stored on the Saleor transaction.
    pub psp_reference: String,
    pub refunded_amount: Decimal,
    pub transaction_total_charged: Decimal,
    pub source_object_total_amount: Decimal,
    pub granted_refund: Option<GrantedRefund>,
    pub saleor_transaction_id: String,
    pub channel_slug: String,
    pub currency: String,
    pub source_object_lines: Vec<RefundSourceLine>,
    pub shipping_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrantedRefund {
    pub lines: Vec<GrantedRefundLine>,
    pub shipping_costs_included: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedRefundLine {
    pub line_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundSourceLine {
    pub id: String,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl GrantedRefund {
    pub fn refunded_quantity(&self, line_id: &str) -> u32 {
        self.lines
            .iter()
            .filter(|line| line.line_id == line_id)
            .map(|line| line.quantity)
            .sum()
    }
}

pub fn parse_refund_event(
    payload: &TransactionRefundRequestedPayload,
) -> Result<ParsedRefundEvent, RefundEventParseError> {
    let transaction = payload
        .transaction
        .as_ref()
        .ok_or(RefundEventParseError::MissingTransaction)?;

    let psp_reference = transaction
        .psp_reference
        .as_deref()
        .filter(|reference| !reference.is_empty())
        .ok_or_else(|| RefundEventParseError::MissingPspReference(transaction.id.clone()))?;

    let source_object: &SourceObject = transaction
        .source_object
        .as_ref()
        .ok_or_else(|| RefundEventParseError::MissingSourceObject(transaction.id.clone()))?;

    if payload.action.currency != SUPPORTED_CURRENCY {
        return Err(RefundEventParseError::UnsupportedCurrency(
            payload.action.currency.clone(),
        ));
    }

    let source_object_lines: Vec<RefundSourceLine> = source_object
        .lines
        .iter()
        .map(|line| RefundSourceLine {
            id: line.id.clone(),
            product_name: line.product_name.clone(),
            product_sku: line.product_sku.clone(),
            unit_price: line.unit_price.gross.amount,
            quantity: line.quantity,
        })
        .collect();

    let granted_refund = payload
        .granted_refund
        .as_ref()
        .map(|granted| parse_granted_refund(granted, &source_object_lines))
        .transpose()?;

    Ok(ParsedRefundEvent {
        psp_reference: psp_reference.to_string(),
        refunded_amount: payload.action.amount,
        transaction_total_charged: transaction.charged_amount.amount,
        source_object_total_amount: source_object.total.gross.amount,
        granted_refund,
        saleor_transaction_id: transaction.id.clone(),
        channel_slug: source_object.channel.slug.clone(),
        currency: payload.action.currency.clone(),
        source_object_lines,
        shipping_amount: source_object
            .shipping_price
            .as_ref()
            .map(|price| price.gross.amount)
            .unwrap_or(Decimal::ZERO),
    })
}

fn parse_granted_refund(
    granted: &GrantedRefundPayload,
    source_lines: &[RefundSourceLine],
) -> Result<GrantedRefund, RefundEventParseError> {
    let lines = granted
        .lines
        .iter()
        .flatten()
        .map(|line| {
            let line_id = &line.order_line.id;
            if !source_lines.iter().any(|source| &source.id == line_id) {
                return Err(RefundEventParseError::UnknownLine(line_id.clone()));
            }
            Ok(GrantedRefundLine {
                line_id: line_id.clone(),
                quantity: line.quantity,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GrantedRefund {
        lines,
        shipping_costs_included: granted.shipping_costs_included,
    })
}
