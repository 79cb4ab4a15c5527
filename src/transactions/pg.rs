use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{TransactionRecord, TransactionRecordRepo, TransactionStatus};
use crate::atobarai::AtobaraiTransactionId;
use crate::db::{AppDb, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct TransactionRecordRow {
    saleor_transaction_id: String,
    atobarai_transaction_id: String,
    saleor_tracking_number: Option<String>,
    status: String,
    billed_amount: Decimal,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRecordRow> for TransactionRecord {
    type Error = StoreError;

    fn try_from(row: TransactionRecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            saleor_transaction_id: row.saleor_transaction_id,
            atobarai_transaction_id: AtobaraiTransactionId::new(row.atobarai_transaction_id),
            saleor_tracking_number: row.saleor_tracking_number,
            billed_amount: row.billed_amount,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgTransactionRecordRepo {
    pool: AppDb,
}

impl PgTransactionRecordRepo {
    pub fn new(pool: AppDb) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRecordRepo for PgTransactionRecordRepo {
    async fn save(&self, record: &TransactionRecord) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO transaction_records
                (saleor_transaction_id, atobarai_transaction_id, saleor_tracking_number,
                 status, billed_amount, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (saleor_transaction_id) DO NOTHING
            "#,
        )
        .bind(&record.saleor_transaction_id)
        .bind(record.atobarai_transaction_id.as_str())
        .bind(&record.saleor_tracking_number)
        .bind(record.status.as_str())
        .bind(record.billed_amount)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_billing(
        &self,
        saleor_transaction_id: &str,
        status: TransactionStatus,
        billed_amount: Decimal,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE transaction_records
            SET status = $2, billed_amount = $3, updated_at = NOW()
            WHERE saleor_transaction_id = $1
            "#,
        )
        .bind(saleor_transaction_id)
        .bind(status.as_str())
        .bind(billed_amount)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(saleor_transaction_id.to_string()));
        }
        Ok(())
    }

    async fn update_fulfillment(
        &self,
        saleor_transaction_id: &str,
        tracking_number: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE transaction_records
            SET saleor_tracking_number = $2,
                status = CASE WHEN status = $3 THEN status ELSE $4 END,
                updated_at = NOW()
            WHERE saleor_transaction_id = $1
            "#,
        )
        .bind(saleor_transaction_id)
        .bind(tracking_number)
        .bind(TransactionStatus::Cancelled.as_str())
        .bind(TransactionStatus::Fulfilled.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(saleor_transaction_id.to_string()));
        }
        Ok(())
    }

    async fn get_by_saleor_transaction_id(
        &self,
        saleor_transaction_id: &str,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let row: Option<TransactionRecordRow> =
            sqlx::query_as("SELECT * FROM transaction_records WHERE saleor_transaction_id = $1")
                .bind(saleor_transaction_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TransactionRecord::try_from).transpose()
    }

    async fn get_by_atobarai_transaction_id(
        &self,
        atobarai_transaction_id: &AtobaraiTransactionId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let row: Option<TransactionRecordRow> =
            sqlx::query_as("SELECT * FROM transaction_records WHERE atobarai_transaction_id = $1")
                .bind(atobarai_transaction_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(TransactionRecord::try_from).transpose()
    }
}
