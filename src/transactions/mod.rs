//! Transaction record store: Saleor transaction id to NP Atobarai
//! transaction id, tracking number and last known state.
//!
//! Records are written by the initialize-session and fulfillment webhooks and
//! updated by the refund strategies. Updates touch only the columns their
//! event owns, so a refund and a fulfillment racing on one record do not
//! overwrite each other.

mod in_memory;
mod pg;
mod record;

use async_trait::async_trait;
use rust_decimal::Decimal;

pub use in_memory::InMemoryTransactionRecordRepo;
pub use pg::PgTransactionRecordRepo;
pub use record::{TransactionRecord, TransactionStatus};

use crate::atobarai::AtobaraiTransactionId;
use crate::db::StoreError;

#[async_trait]
pub trait TransactionRecordRepo: Send + Sync {
    /// Insert the record unless one exists for its Saleor transaction id.
    /// Returns `false` and leaves the stored record untouched otherwise.
    async fn save(&self, record: &TransactionRecord) -> Result<bool, StoreError>;

    /// Set status and billed amount only; the tracking number is left as stored.
    /// [`StoreError::NotFound`] if there is no record.
    async fn update_billing(
        &self,
        saleor_transaction_id: &str,
        status: TransactionStatus,
        billed_amount: Decimal,
    ) -> Result<(), StoreError>;

    /// Store the tracking number and mark the record fulfilled. A cancelled
    /// record keeps its status. [`StoreError::NotFound`] if there is no record.
    async fn update_fulfillment(
        &self,
        saleor_transaction_id: &str,
        tracking_number: &str,
    ) -> Result<(), StoreError>;

    async fn get_by_saleor_transaction_id(
        &self,
        saleor_transaction_id: &str,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    async fn get_by_atobarai_transaction_id(
        &self,
        atobarai_transaction_id: &AtobaraiTransactionId,
    ) -> Result<Option<TransactionRecord>, StoreError>;
}
