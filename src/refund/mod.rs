//! Refund orchestration for `TRANSACTION_REFUND_REQUESTED`.
//!
//! ```text
//! payload ─► event_parser ─► ParsedRefundEvent
//!                                   │
//!   TransactionRecord ─► phase ─► orchestrator ─► policy::classify
//!                                   │
//!                                   ▼
//!                        strategy (1 of 6) ─► NP Atobarai + record store
//! ```
//!
//! The orchestrator is not idempotent: a redelivered event runs its strategy
//! against NP Atobarai again.

pub mod error;
pub mod event_parser;
pub mod orchestrator;
pub mod phase;
pub mod policy;
pub mod response;
pub mod strategy;

pub use error::RefundError;
pub use event_parser::{parse_refund_event, ParsedRefundEvent, RefundEventParseError};
pub use orchestrator::{
    AfterFulfillmentRefundOrchestrator, BeforeFulfillmentRefundOrchestrator, RefundOrchestrator,
    RefundRequest,
};
pub use phase::FulfillmentPhase;
pub use policy::RefundKind;
pub use response::RefundUseCaseResponse;
