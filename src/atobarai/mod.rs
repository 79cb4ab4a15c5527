//! NP Atobarai partner API.
//!
//! [`AtobaraiApiClient`] is the seam the refund strategies and webhook
//! handlers talk to. The HTTP implementation lives in [`client`]; tests use the
//! generated `MockAtobaraiApiClient`.

pub mod client;
pub mod error;
pub mod goods;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::AtobaraiApiError;
pub use types::{
    AtobaraiCredentials, AtobaraiEnvironment, AtobaraiTransactionId, AuthorizationResult,
    AuthorizationStatus, CancelTransactionPayload, ChangeTransactionPayload, Customer, Goods,
    RegisterTransactionPayload, ReportFulfillmentPayload, ShippingCompanyCode, TransactionResult,
};

/// Stateless façade over the NP Atobarai REST API. Every call is a single
/// request; nothing is retried here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AtobaraiApiClient: Send + Sync {
    async fn register_transaction(
        &self,
        payload: &RegisterTransactionPayload,
    ) -> Result<AuthorizationResult, AtobaraiApiError>;

    /// Re-authorizes an existing transaction with a new billed amount.
    async fn change_transaction(
        &self,
        payload: &ChangeTransactionPayload,
    ) -> Result<AuthorizationResult, AtobaraiApiError>;

    async fn cancel_transaction(
        &self,
        payload: &CancelTransactionPayload,
    ) -> Result<TransactionResult, AtobaraiApiError>;

    async fn report_fulfillment(
        &self,
        payload: &ReportFulfillmentPayload,
    ) -> Result<TransactionResult, AtobaraiApiError>;

    async fn verify_credentials(&self) -> Result<(), AtobaraiApiError>;
}

pub trait AtobaraiApiClientFactory: Send + Sync {
    fn create(&self, credentials: &AtobaraiCredentials) -> Arc<dyn AtobaraiApiClient>;
}
