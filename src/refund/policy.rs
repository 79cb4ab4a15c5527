//! Refund classification shared by both orchestrators.
//!
//! Predicates are checked in a fixed order: full first, so a refund of the
//! whole transaction never lands in a partial strategy.

use tracing::warn;

use super::error::RefundError;
use super::event_parser::ParsedRefundEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundKind {
    Full,
    PartialWithLineItems,
    PartialWithoutLineItems,
}

/// Compares against the transaction, not the order: the order may have been
/// paid partly by other transactions such as gift cards.
pub fn is_full_refund(event: &ParsedRefundEvent) -> bool {
    event.refunded_amount == event.transaction_total_charged
}

pub fn is_partial_refund_with_line_items(event: &ParsedRefundEvent) -> bool {
    event.refunded_amount < event.source_object_total_amount && event.granted_refund.is_some()
}

pub fn is_partial_refund_without_line_items(event: &ParsedRefundEvent) -> bool {
    event.refunded_amount < event.source_object_total_amount && event.granted_refund.is_none()
}

pub fn classify(event: &ParsedRefundEvent) -> Result<RefundKind, RefundError> {
    if is_full_refund(event) {
        return Ok(RefundKind::Full);
    }
    if is_partial_refund_with_line_items(event) {
        return Ok(RefundKind::PartialWithLineItems);
    }
    if is_partial_refund_without_line_items(event) {
        return Ok(RefundKind::PartialWithoutLineItems);
    }

    warn!(
        psp_reference = %event.psp_reference,
        refunded = %event.refunded_amount,
        charged = %event.transaction_total_charged,
        order_total = %event.source_object_total_amount,
        "No refund strategy matches the event"
    );
    Err(RefundError::NoMatchingStrategy {
        psp_reference: event.psp_reference.clone(),
    })
}
