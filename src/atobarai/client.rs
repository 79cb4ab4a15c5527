//! reqwest implementation of [`AtobaraiApiClient`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::AtobaraiApiError;
use super::types::{
    AtobaraiCredentials, AtobaraiTransactionId, AuthorizationResult, CancelTransactionPayload,
    ChangeTransactionPayload, ErrorBody, RegisterTransactionPayload, ReportFulfillmentPayload,
    Results, TransactionResult, Transactions,
};
use super::{AtobaraiApiClient, AtobaraiApiClientFactory};

const TERMINAL_ID_HEADER: &str = "X-NP-Terminal-Id";

pub struct HttpAtobaraiApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: AtobaraiCredentials,
}

impl HttpAtobaraiApiClient {
    pub fn new(http: reqwest::Client, credentials: AtobaraiCredentials) -> Self {
        Self {
            http,
            base_url: credentials.environment.base_url().to_string(),
            credentials,
        }
    }

    async fn send<B, R>(&self, method: Method, path: &str, body: &B) -> Result<R, AtobaraiApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        debug!("NP Atobarai {} {}", method, path);

        let response = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(
                &self.credentials.merchant_code,
                Some(&self.credentials.secret_sp_code),
            )
            .header(TERMINAL_ID_HEADER, &self.credentials.terminal_id)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        warn!("NP Atobarai {} answered {}", path, status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(AtobaraiApiError::Unauthorized);
        }
        if status.is_server_error() {
            return Err(AtobaraiApiError::Server {
                status: status.as_u16(),
            });
        }

        let codes = serde_json::from_slice::<ErrorBody>(&bytes)
            .map(|body| body.errors.into_iter().flat_map(|e| e.codes).collect())
            .unwrap_or_default();

        Err(AtobaraiApiError::Rejected {
            status: status.as_u16(),
            codes,
        })
    }

    async fn send_single<T, R>(&self, method: Method, path: &str, item: &T) -> Result<R, AtobaraiApiError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let results: Results<R> = self.send(method, path, &Transactions::single(item)).await?;
        results
            .results
            .into_iter()
            .next()
            .ok_or(AtobaraiApiError::EmptyResult)
    }
}

#[async_trait]
impl AtobaraiApiClient for HttpAtobaraiApiClient {
    async fn register_transaction(
        &self,
        payload: &RegisterTransactionPayload,
    ) -> Result<AuthorizationResult, AtobaraiApiError> {
        self.send_single(Method::POST, "/transactions", payload).await
    }

    async fn change_transaction(
        &self,
        payload: &ChangeTransactionPayload,
    ) -> Result<AuthorizationResult, AtobaraiApiError> {
        self.send_single(Method::PATCH, "/transactions/update", payload)
            .await
    }

    async fn cancel_transaction(
        &self,
        payload: &CancelTransactionPayload,
    ) -> Result<TransactionResult, AtobaraiApiError> {
        self.send_single(Method::PATCH, "/transactions/cancel", payload)
            .await
    }

    async fn report_fulfillment(
        &self,
        payload: &ReportFulfillmentPayload,
    ) -> Result<TransactionResult, AtobaraiApiError> {
        self.send_single(Method::POST, "/shipments", payload).await
    }

    async fn verify_credentials(&self) -> Result<(), AtobaraiApiError> {
        // NP has no dedicated endpoint: an authorization lookup for an unknown id
        // answers 400 with valid credentials and 401 without them.
        let verification = CancelTransactionPayload {
            np_transaction_id: AtobaraiTransactionId::new("credentials-check"),
        };
        match self
            .send::<_, serde_json::Value>(
                Method::POST,
                "/authorizations/find",
                &Transactions::single(&verification),
            )
            .await
        {
            Ok(_) | Err(AtobaraiApiError::Rejected { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Builds one [`HttpAtobaraiApiClient`] per channel config, sharing the
/// underlying connection pool.
pub struct HttpAtobaraiApiClientFactory {
    http: reqwest::Client,
}

impl HttpAtobaraiApiClientFactory {
    pub fn new(timeout: Duration) -> Result<Self, AtobaraiApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl AtobaraiApiClientFactory for HttpAtobaraiApiClientFactory {
    fn create(&self, credentials: &AtobaraiCredentials) -> Arc<dyn AtobaraiApiClient> {
        Arc::new(HttpAtobaraiApiClient::new(
            self.http.clone(),
            credentials.clone(),
        ))
    }
}
