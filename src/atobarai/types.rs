//! Identifiers, credentials and wire shapes of the NP Atobarai REST API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transaction id issued by NP Atobarai on registration (`np_transaction_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtobaraiTransactionId(String);

impl AtobaraiTransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AtobaraiTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Carrier code NP Atobarai expects in `pd_company_code` when a shipment is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShippingCompanyCode(String);

impl ShippingCompanyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtobaraiEnvironment {
    Sandbox,
    Production,
}

impl AtobaraiEnvironment {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://ctcp.np-payment-gateway.com/v1",
            Self::Production => "https://cp.np-payment-gateway.com/v1",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl FromStr for AtobaraiEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!("unknown NP Atobarai environment: {other}")),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtobaraiCredentials {
    pub merchant_code: String,
    pub terminal_id: String,
    pub secret_sp_code: String,
    pub environment: AtobaraiEnvironment,
}

impl fmt::Debug for AtobaraiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtobaraiCredentials")
            .field("merchant_code", &self.merchant_code)
            .field("terminal_id", &self.terminal_id)
            .field("secret_sp_code", &"*** redacted ***")
            .field("environment", &self.environment)
            .finish()
    }
}

// ============================================================================
// Request payloads
// ============================================================================

/// Every NP Atobarai endpoint wraps its items in a `transactions` array.
#[derive(Debug, Serialize)]
pub struct Transactions<'a, T> {
    pub transactions: [&'a T; 1],
}

impl<'a, T> Transactions<'a, T> {
    pub fn single(item: &'a T) -> Self {
        Self { transactions: [item] }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Goods {
    pub goods_name: String,
    pub goods_price: i64,
    pub quantity: u32,
}

impl Goods {
    /// `None` when price times quantity overflows.
    pub fn checked_total(&self) -> Option<i64> {
        self.goods_price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub zip_code: String,
    pub address: String,
    pub tel: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterTransactionPayload {
    pub shop_transaction_id: String,
    /// `YYYY-MM-DD`.
    pub shop_order_date: String,
    /// `02` is "invoice sent separately", the only settlement type used.
    pub settlement_type: &'static str,
    pub billed_amount: i64,
    pub customer: Customer,
    pub goods: Vec<Goods>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeTransactionPayload {
    pub np_transaction_id: AtobaraiTransactionId,
    pub billed_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goods: Option<Vec<Goods>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelTransactionPayload {
    pub np_transaction_id: AtobaraiTransactionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFulfillmentPayload {
    pub np_transaction_id: AtobaraiTransactionId,
    pub pd_company_code: ShippingCompanyCode,
    pub slip_no: String,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    #[serde(rename = "00")]
    Ok,
    #[serde(rename = "10")]
    Pending,
    #[serde(rename = "20")]
    Ng,
    #[serde(rename = "40")]
    InReview,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizationResult {
    pub np_transaction_id: AtobaraiTransactionId,
    pub authori_result: AuthorizationStatus,
    #[serde(default)]
    pub authori_ng: Option<String>,
    #[serde(default)]
    pub authori_hold: Vec<String>,
}

impl AuthorizationResult {
    /// Reason codes NP attaches to a non-OK authorization.
    pub fn reason_codes(&self) -> Vec<String> {
        self.authori_ng
            .iter()
            .cloned()
            .chain(self.authori_hold.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionResult {
    pub np_transaction_id: AtobaraiTransactionId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Results<T> {
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEntry {
    #[serde(default)]
    pub codes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_payload_without_goods_omits_the_field() {
        let payload = ChangeTransactionPayload {
            np_transaction_id: AtobaraiTransactionId::new("np-1"),
            billed_amount: 700,
            goods: None,
        };
        let body = serde_json::to_value(Transactions::single(&payload)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"transactions": [{"np_transaction_id": "np-1", "billed_amount": 700}]})
        );
    }

    #[test]
    fn authorization_result_decodes_status_codes() {
        let body = r#"{"results":[{"np_transaction_id":"np-9","authori_result":"20","authori_ng":"NG002"}]}"#;
        let parsed: Results<AuthorizationResult> = serde_json::from_str(body).unwrap();
        let result = &parsed.results[0];
        assert_eq!(result.authori_result, AuthorizationStatus::Ng);
        assert_eq!(result.reason_codes(), vec!["NG002".to_string()]);
    }

    #[test]
    fn unknown_status_code_is_not_an_error() {
        let body = r#"{"np_transaction_id":"np-9","authori_result":"99"}"#;
        let result: AuthorizationResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.authori_result, AuthorizationStatus::Unknown);
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let credentials = AtobaraiCredentials {
            merchant_code: "merchant".into(),
            terminal_id: "terminal".into(),
            secret_sp_code: "very-secret".into(),
            environment: AtobaraiEnvironment::Sandbox,
        };
        assert!(!format!("{credentials:?}").contains("very-secret"));
    }
}
