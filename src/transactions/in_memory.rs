use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::{TransactionRecord, TransactionRecordRepo, TransactionStatus};
use crate::atobarai::AtobaraiTransactionId;
use crate::db::StoreError;

/// Map-backed store for tests and local runs without Postgres.
#[derive(Default)]
pub struct InMemoryTransactionRecordRepo {
    records: RwLock<HashMap<String, TransactionRecord>>,
}

impl InMemoryTransactionRecordRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Corrupt("transaction record lock poisoned".into())
    }

    fn modify(
        &self,
        saleor_transaction_id: &str,
        change: impl FnOnce(&mut TransactionRecord),
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        let record = records
            .get_mut(saleor_transaction_id)
            .ok_or_else(|| StoreError::NotFound(saleor_transaction_id.to_string()))?;
        change(record);
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl TransactionRecordRepo for InMemoryTransactionRecordRepo {
    async fn save(&self, record: &TransactionRecord) -> Result<bool, StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        if records.contains_key(&record.saleor_transaction_id) {
            return Ok(false);
        }
        records.insert(record.saleor_transaction_id.clone(), record.clone());
        Ok(true)
    }

    async fn update_billing(
        &self,
        saleor_transaction_id: &str,
        status: TransactionStatus,
        billed_amount: Decimal,
    ) -> Result<(), StoreError> {
        self.modify(saleor_transaction_id, |record| {
            record.status = status;
            record.billed_amount = billed_amount;
        })
    }

    async fn update_fulfillment(
        &self,
        saleor_transaction_id: &str,
        tracking_number: &str,
    ) -> Result<(), StoreError> {
        self.modify(saleor_transaction_id, |record| {
            record.saleor_tracking_number = Some(tracking_number.to_string());
            if record.status != TransactionStatus::Cancelled {
                record.status = TransactionStatus::Fulfilled;
            }
        })
    }

    async fn get_by_saleor_transaction_id(
        &self,
        saleor_transaction_id: &str,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(saleor_transaction_id).cloned())
    }

    async fn get_by_atobarai_transaction_id(
        &self,
        atobarai_transaction_id: &AtobaraiTransactionId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records
            .values()
            .find(|record| &record.atobarai_transaction_id == atobarai_transaction_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_by_either_id() {
        let repo = InMemoryTransactionRecordRepo::new();
        let record = TransactionRecord::registered(
            "saleor-1",
            AtobaraiTransactionId::new("np-1"),
            Decimal::new(1000, 0),
        );
        repo.save(&record).await.unwrap();

        assert_eq!(
            repo.get_by_saleor_transaction_id("saleor-1").await.unwrap(),
            Some(record.clone())
        );
        assert_eq!(
            repo.get_by_atobarai_transaction_id(&AtobaraiTransactionId::new("np-1"))
                .await
                .unwrap(),
            Some(record)
        );
        assert_eq!(
            repo.get_by_atobarai_transaction_id(&AtobaraiTransactionId::new("np-2"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn save_keeps_an_existing_record() {
        let repo = InMemoryTransactionRecordRepo::new();
        let record = TransactionRecord::registered(
            "saleor-1",
            AtobaraiTransactionId::new("np-1"),
            Decimal::new(1000, 0),
        );
        assert!(repo.save(&record).await.unwrap());
        repo.update_fulfillment("saleor-1", "TRACK-1").await.unwrap();

        assert!(!repo.save(&record).await.unwrap());

        let stored = repo.get_by_saleor_transaction_id("saleor-1").await.unwrap().unwrap();
        assert_eq!(stored.saleor_tracking_number.as_deref(), Some("TRACK-1"));
        assert_eq!(stored.status, TransactionStatus::Fulfilled);
    }

    #[tokio::test]
    async fn updates_require_existing_record() {
        let repo = InMemoryTransactionRecordRepo::new();

        let err = repo
            .update_billing("saleor-1", TransactionStatus::Cancelled, Decimal::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "saleor-1"));
        assert!(matches!(
            repo.update_fulfillment("saleor-1", "TRACK-1").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn billing_and_fulfillment_updates_do_not_overwrite_each_other() {
        let repo = InMemoryTransactionRecordRepo::new();
        let record = TransactionRecord::registered(
            "saleor-1",
            AtobaraiTransactionId::new("np-1"),
            Decimal::new(1000, 0),
        );
        repo.save(&record).await.unwrap();

        repo.update_fulfillment("saleor-1", "TRACK-1").await.unwrap();
        repo.update_billing("saleor-1", TransactionStatus::Changed, Decimal::new(700, 0))
            .await
            .unwrap();

        let stored = repo.get_by_saleor_transaction_id("saleor-1").await.unwrap().unwrap();
        assert_eq!(stored.saleor_tracking_number.as_deref(), Some("TRACK-1"));
        assert_eq!(stored.status, TransactionStatus::Changed);
        assert_eq!(stored.billed_amount, Decimal::new(700, 0));
    }

    #[tokio::test]
    async fn fulfillment_keeps_cancelled_status() {
        let repo = InMemoryTransactionRecordRepo::new();
        let record = TransactionRecord::registered(
            "saleor-1",
            AtobaraiTransactionId::new("np-1"),
            Decimal::new(1000, 0),
        );
        repo.save(&record).await.unwrap();
        repo.update_billing("saleor-1", TransactionStatus::Cancelled, Decimal::ZERO)
            .await
            .unwrap();

        repo.update_fulfillment("saleor-1", "TRACK-1").await.unwrap();

        let stored = repo.get_by_saleor_transaction_id("saleor-1").await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Cancelled);
    }
}
