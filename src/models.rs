//! Wire models for the Saleor webhooks and the service's own JSON responses.
//!
//! Payload structs mirror the subscription queries registered for each
//! webhook; everything the subscription may omit is an `Option`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::app_config::AppChannelConfig;
use crate::atobarai::{AtobaraiCredentials, ShippingCompanyCode};

// ============================================================================
// Shared payload fragments
// ============================================================================

/// Implemented by every payload carrying the `recipient` fragment.
pub trait WithRecipient {
    fn recipient_id(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recipient {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxedMoney {
    pub gross: Money,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRef {
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAction {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceObjectLine {
    pub id: String,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub quantity: u32,
    pub unit_price: TaxedMoney,
}

/// Order or checkout the transaction belongs to. Checkout fields are aliased
/// to the order shape in the subscription query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceObject {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub id: String,
    pub channel: ChannelRef,
    pub total: TaxedMoney,
    pub shipping_price: Option<TaxedMoney>,
    #[serde(default)]
    pub lines: Vec<SourceObjectLine>,
    pub user_email: Option<String>,
    pub billing_address: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub company_name: Option<String>,
    pub postal_code: String,
    pub country_area: String,
    pub city: String,
    pub street_address1: String,
    pub street_address2: Option<String>,
    pub phone: Option<String>,
}

// ============================================================================
// TRANSACTION_REFUND_REQUESTED
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRefundRequestedPayload {
    pub recipient: Option<Recipient>,
    pub action: TransactionAction,
    pub transaction: Option<RefundTransaction>,
    pub granted_refund: Option<GrantedRefundPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundTransaction {
    pub id: String,
    pub psp_reference: Option<String>,
    pub charged_amount: Money,
    pub source_object: Option<SourceObject>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedRefundPayload {
    pub lines: Option<Vec<GrantedRefundLinePayload>>,
    #[serde(default)]
    pub shipping_costs_included: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedRefundLinePayload {
    pub quantity: u32,
    pub order_line: OrderLineRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRef {
    pub id: String,
}

impl WithRecipient for TransactionRefundRequestedPayload {
    fn recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|r| r.id.as_str())
    }
}

// ============================================================================
// TRANSACTION_INITIALIZE_SESSION
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInitializeSessionPayload {
    pub recipient: Option<Recipient>,
    pub action: TransactionAction,
    pub transaction: SessionTransaction,
    pub source_object: SourceObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionTransaction {
    pub id: String,
}

impl WithRecipient for TransactionInitializeSessionPayload {
    fn recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|r| r.id.as_str())
    }
}

// ============================================================================
// FULFILLMENT_TRACKING_NUMBER_UPDATED
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentTrackingNumberUpdatedPayload {
    pub recipient: Option<Recipient>,
    pub fulfillment: Option<FulfillmentRef>,
    pub order: Option<FulfilledOrder>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentRef {
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfilledOrder {
    pub id: String,
    pub channel: ChannelRef,
    #[serde(default)]
    pub transactions: Vec<OrderTransactionRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTransactionRef {
    pub id: String,
    pub psp_reference: Option<String>,
}

impl WithRecipient for FulfillmentTrackingNumberUpdatedPayload {
    fn recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|r| r.id.as_str())
    }
}

// ============================================================================
// Webhook responses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionResultCode {
    RefundSuccess,
    RefundFailure,
    ChargeSuccess,
    ChargeFailure,
    ChargeActionRequired,
}

/// Body Saleor expects from synchronous transaction webhooks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWebhookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psp_reference: Option<String>,
    pub result: TransactionResultCode,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FulfillmentReportResponse {
    pub reported: Vec<String>,
}

// ============================================================================
// Configuration API
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChannelConfigInput {
    pub name: String,
    pub credentials: AtobaraiCredentials,
    pub shipping_company_code: Option<ShippingCompanyCode>,
    #[serde(default)]
    pub sku_as_name: bool,
}

impl ChannelConfigInput {
    pub fn into_config(self, channel_slug: String) -> AppChannelConfig {
        AppChannelConfig {
            channel_slug,
            name: self.name,
            credentials: self.credentials,
            shipping_company_code: self.shipping_company_code,
            sku_as_name: self.sku_as_name,
        }
    }
}

/// Channel config as returned by the API, without the secret.
#[derive(Debug, Serialize)]
pub struct ChannelConfigView {
    pub channel_slug: String,
    pub name: String,
    pub merchant_code: String,
    pub terminal_id: String,
    pub environment: &'static str,
    pub shipping_company_code: Option<ShippingCompanyCode>,
    pub sku_as_name: bool,
}

impl From<&AppChannelConfig> for ChannelConfigView {
    fn from(config: &AppChannelConfig) -> Self {
        Self {
            channel_slug: config.channel_slug.clone(),
            name: config.name.clone(),
            merchant_code: config.credentials.merchant_code.clone(),
            terminal_id: config.credentials.terminal_id.clone(),
            environment: config.credentials.environment.as_str(),
            shipping_company_code: config.shipping_company_code.clone(),
            sku_as_name: config.sku_as_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CredentialsCheckResponse {
    pub valid: bool,
}
