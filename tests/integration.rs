//! # Integration Tests
//!
//! These tests start the application router in-process on an ephemeral port,
//! backed by in-memory stores and a scripted NP Atobarai client, and drive it
//! over HTTP with reqwest. No database or network access is needed.
//!
//! ```bash
//! cargo test --test integration
//! ```

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use np_atobarai_app::app_config::InMemoryChannelConfigRepo;
    use np_atobarai_app::atobarai::{
        AtobaraiApiClient, AtobaraiApiClientFactory, AtobaraiApiError, AtobaraiCredentials,
        AtobaraiTransactionId, AuthorizationResult, AuthorizationStatus, CancelTransactionPayload,
        ChangeTransactionPayload, RegisterTransactionPayload, ReportFulfillmentPayload,
        TransactionResult,
    };
    use np_atobarai_app::create_app;
    use np_atobarai_app::state::AppState;
    use np_atobarai_app::transactions::InMemoryTransactionRecordRepo;

    const APP_ID: &str = "app-1";
    const TOKEN: &str = "config-token";

    /// Answers every call successfully and records it as `"<operation> <detail>"`.
    #[derive(Default)]
    struct ScriptedAtobarai {
        calls: Mutex<Vec<String>>,
        registration_status: Option<AuthorizationStatus>,
    }

    impl ScriptedAtobarai {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AtobaraiApiClient for ScriptedAtobarai {
        async fn register_transaction(
            &self,
            payload: &RegisterTransactionPayload,
        ) -> Result<AuthorizationResult, AtobaraiApiError> {
            self.record(format!("register {}", payload.billed_amount));
            Ok(AuthorizationResult {
                np_transaction_id: AtobaraiTransactionId::new("np-1"),
                authori_result: self.registration_status.unwrap_or(AuthorizationStatus::Ok),
                authori_ng: None,
                authori_hold: vec![],
            })
        }

        async fn change_transaction(
            &self,
            payload: &ChangeTransactionPayload,
        ) -> Result<AuthorizationResult, AtobaraiApiError> {
            self.record(format!("change {}", payload.billed_amount));
            Ok(AuthorizationResult {
                np_transaction_id: payload.np_transaction_id.clone(),
                authori_result: AuthorizationStatus::Ok,
                authori_ng: None,
                authori_hold: vec![],
            })
        }

        async fn cancel_transaction(
            &self,
            payload: &CancelTransactionPayload,
        ) -> Result<TransactionResult, AtobaraiApiError> {
            self.record(format!("cancel {}", payload.np_transaction_id));
            Ok(TransactionResult {
                np_transaction_id: payload.np_transaction_id.clone(),
            })
        }

        async fn report_fulfillment(
            &self,
            payload: &ReportFulfillmentPayload,
        ) -> Result<TransactionResult, AtobaraiApiError> {
            self.record(format!("report {}", payload.slip_no));
            Ok(TransactionResult {
                np_transaction_id: payload.np_transaction_id.clone(),
            })
        }

        async fn verify_credentials(&self) -> Result<(), AtobaraiApiError> {
            self.record("verify".to_string());
            Ok(())
        }
    }

    struct ScriptedFactory(Arc<ScriptedAtobarai>);

    impl AtobaraiApiClientFactory for ScriptedFactory {
        fn create(&self, _credentials: &AtobaraiCredentials) -> Arc<dyn AtobaraiApiClient> {
            self.0.clone()
        }
    }

    struct TestApp {
        base_url: String,
        client: reqwest::Client,
        atobarai: Arc<ScriptedAtobarai>,
    }

    impl TestApp {
        async fn post(&self, path: &str, body: Value) -> (u16, Value) {
            let res = self
                .client
                .post(format!("{}{}", self.base_url, path))
                .json(&body)
                .send()
                .await
                .expect("Failed to send request");
            let status = res.status().as_u16();
            (status, res.json().await.unwrap_or(Value::Null))
        }

        async fn configure_channel(&self) {
            let res = self
                .client
                .put(format!("{}/api/config/channels/default-channel", self.base_url))
                .bearer_auth(TOKEN)
                .json(&json!({
                    "name": "Japan",
                    "credentials": {
                        "merchant_code": "merchant",
                        "terminal_id": "terminal",
                        "secret_sp_code": "secret",
                        "environment": "sandbox"
                    },
                    "shipping_company_code": "50000"
                }))
                .send()
                .await
                .expect("Failed to send request");
            assert_eq!(res.status(), 200, "Expected channel config to be saved");
        }
    }

    async fn spawn_app(atobarai: ScriptedAtobarai) -> TestApp {
        let atobarai = Arc::new(atobarai);
        let state = AppState {
            saleor_app_id: APP_ID.to_string(),
            config_api_token: TOKEN.to_string(),
            channel_configs: Arc::new(InMemoryChannelConfigRepo::new()),
            transaction_records: Arc::new(InMemoryTransactionRecordRepo::new()),
            api_clients: Arc::new(ScriptedFactory(atobarai.clone())),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, create_app(state)).await.expect("Server error");
        });

        TestApp {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            atobarai,
        }
    }

    fn source_object() -> Value {
        json!({
            "__typename": "Order",
            "id": "order-1",
            "channel": {"slug": "default-channel"},
            "total": {"gross": {"amount": 6500, "currency": "JPY"}},
            "shippingPrice": {"gross": {"amount": 500, "currency": "JPY"}},
            "lines": [{
                "id": "L1",
                "productName": "Green tea",
                "productSku": "TEA-1",
                "quantity": 2,
                "unitPrice": {"gross": {"amount": 3000, "currency": "JPY"}}
            }],
            "userEmail": "hanako@example.com",
            "billingAddress": {
                "firstName": "Hanako",
                "lastName": "Yamada",
                "companyName": null,
                "postalCode": "100-0001",
                "countryArea": "東京都",
                "city": "千代田区",
                "streetAddress1": "千代田1-1",
                "streetAddress2": null,
                "phone": "03-1234-5678"
            }
        })
    }

    fn session_payload(recipient: &str) -> Value {
        json!({
            "recipient": {"id": recipient},
            "action": {"amount": 6500, "currency": "JPY"},
            "transaction": {"id": "saleor-tx-1"},
            "sourceObject": source_object()
        })
    }

    fn refund_payload(amount: i64, granted: Value) -> Value {
        json!({
            "recipient": {"id": APP_ID},
            "action": {"amount": amount, "currency": "JPY"},
            "transaction": {
                "id": "saleor-tx-1",
                "pspReference": "np-1",
                "chargedAmount": {"amount": 6500, "currency": "JPY"},
                "sourceObject": source_object()
            },
            "grantedRefund": granted
        })
    }

    fn fulfillment_payload(tracking_number: &str) -> Value {
        json!({
            "recipient": {"id": APP_ID},
            "fulfillment": {"trackingNumber": tracking_number},
            "order": {
                "id": "order-1",
                "channel": {"slug": "default-channel"},
                "transactions": [{"id": "saleor-tx-1", "pspReference": "np-1"}]
            }
        })
    }

    async fn registered_app() -> TestApp {
        let app = spawn_app(ScriptedAtobarai::default()).await;
        app.configure_channel().await;
        let (status, body) = app
            .post("/api/webhooks/saleor/transaction-initialize-session", session_payload(APP_ID))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["result"], "CHARGE_SUCCESS");
        app
    }

    #[tokio::test]
    async fn test_health() {
        let app = spawn_app(ScriptedAtobarai::default()).await;
        let res = app
            .client
            .get(format!("{}/health", app.base_url))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn test_initialize_session_registers_transaction() {
        let app = registered_app().await;
        assert_eq!(app.atobarai.calls(), vec!["register 6500"]);
    }

    #[tokio::test]
    async fn test_initialize_session_pending_review() {
        let app = spawn_app(ScriptedAtobarai {
            registration_status: Some(AuthorizationStatus::Pending),
            ..Default::default()
        })
        .await;
        app.configure_channel().await;

        let (status, body) = app
            .post("/api/webhooks/saleor/transaction-initialize-session", session_payload(APP_ID))
            .await;

        assert_eq!(status, 200);
        assert_eq!(body["result"], "CHARGE_ACTION_REQUIRED");
        assert_eq!(body["pspReference"], "np-1");
    }

    #[tokio::test]
    async fn test_recipient_mismatch_is_forbidden() {
        let app = spawn_app(ScriptedAtobarai::default()).await;
        app.configure_channel().await;

        let (status, _) = app
            .post("/api/webhooks/saleor/transaction-initialize-session", session_payload("other-app"))
            .await;

        assert_eq!(status, 403);
        assert!(app.atobarai.calls().is_empty());
    }

    #[tokio::test]
    async fn test_full_refund_cancels() {
        let app = registered_app().await;

        let (status, body) = app
            .post("/api/webhooks/saleor/transaction-refund-requested", refund_payload(6500, Value::Null))
            .await;

        assert_eq!(status, 200);
        assert_eq!(body["result"], "REFUND_SUCCESS");
        assert_eq!(body["pspReference"], "np-1");
        assert_eq!(app.atobarai.calls(), vec!["register 6500", "cancel np-1"]);
    }

    #[tokio::test]
    async fn test_partial_refund_before_fulfillment_changes_amount() {
        let app = registered_app().await;

        let (status, body) = app
            .post("/api/webhooks/saleor/transaction-refund-requested", refund_payload(1000, Value::Null))
            .await;

        assert_eq!(status, 200);
        assert_eq!(body["result"], "REFUND_SUCCESS");
        assert_eq!(body["amount"], 1000.0);
        assert_eq!(app.atobarai.calls(), vec!["register 6500", "change 5500"]);
    }

    #[tokio::test]
    async fn test_partial_refund_after_fulfillment_reports_again() {
        let app = registered_app().await;

        let (status, body) = app
            .post(
                "/api/webhooks/saleor/fulfillment-tracking-number-updated",
                fulfillment_payload("TRACK-1"),
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["reported"], json!(["np-1"]));

        let granted = json!({"lines": [{"quantity": 1, "orderLine": {"id": "L1"}}]});
        let (status, body) = app
            .post("/api/webhooks/saleor/transaction-refund-requested", refund_payload(3000, granted))
            .await;

        assert_eq!(status, 200);
        assert_eq!(body["result"], "REFUND_SUCCESS");
        assert_eq!(
            app.atobarai.calls(),
            vec!["register 6500", "report TRACK-1", "change 3500", "report TRACK-1"]
        );
    }

    #[tokio::test]
    async fn test_over_refund_is_a_server_error_without_partner_calls() {
        let app = registered_app().await;

        let (status, _) = app
            .post("/api/webhooks/saleor/transaction-refund-requested", refund_payload(9000, Value::Null))
            .await;

        assert_eq!(status, 500);
        assert_eq!(app.atobarai.calls(), vec!["register 6500"]);
    }

    #[tokio::test]
    async fn test_refund_for_unknown_channel_is_rejected() {
        let app = spawn_app(ScriptedAtobarai::default()).await;

        let (status, _) = app
            .post("/api/webhooks/saleor/transaction-refund-requested", refund_payload(1000, Value::Null))
            .await;

        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_config_requires_token() {
        let app = spawn_app(ScriptedAtobarai::default()).await;

        let res = app
            .client
            .get(format!("{}/api/config/channels/default-channel", app.base_url))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 401);
    }

    #[tokio::test]
    async fn test_config_roundtrip_hides_secret() {
        let app = spawn_app(ScriptedAtobarai::default()).await;

        let res = app
            .client
            .get(format!("{}/api/config/channels/default-channel", app.base_url))
            .bearer_auth(TOKEN)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 404);

        app.configure_channel().await;

        let res = app
            .client
            .get(format!("{}/api/config/channels/default-channel", app.base_url))
            .bearer_auth(TOKEN)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 200);

        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["merchant_code"], "merchant");
        assert_eq!(body["data"]["shipping_company_code"], "50000");
        assert!(body["data"].get("secret_sp_code").is_none());
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let app = spawn_app(ScriptedAtobarai::default()).await;

        let res = app
            .client
            .post(format!("{}/api/config/verify-credentials", app.base_url))
            .bearer_auth(TOKEN)
            .json(&json!({
                "merchant_code": "merchant",
                "terminal_id": "terminal",
                "secret_sp_code": "secret",
                "environment": "sandbox"
            }))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["valid"], true);
        assert_eq!(app.atobarai.calls(), vec!["verify"]);
    }
}
