//! `TRANSACTION_INITIALIZE_SESSION`: register the checkout or order with NP
//! Atobarai and record the mapping the refund flow looks up later.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use super::channel_config;
use crate::app_config::AppChannelConfig;
use crate::atobarai::goods::{build_goods, to_yen, GoodsLine};
use crate::atobarai::{AuthorizationStatus, Customer, RegisterTransactionPayload};
use crate::error::ApiError;
use crate::models::{
    Address, SourceObject, TransactionInitializeSessionPayload, TransactionResultCode,
    TransactionWebhookResponse,
};
use crate::refund::event_parser::SUPPORTED_CURRENCY;
use crate::state::AppState;
use crate::transactions::{TransactionRecord, TransactionStatus};

/// "Invoice sent separately", the only settlement type the app uses.
const SETTLEMENT_TYPE: &str = "02";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionEventParseError {
    #[error("currency {0} is not supported, NP Atobarai settles in JPY only")]
    UnsupportedCurrency(String),
    #[error("{0} has no billing address")]
    MissingBillingAddress(String),
    #[error("{0} has no customer email")]
    MissingEmail(String),
    #[error("{0} has no phone number on its billing address")]
    MissingPhone(String),
    #[error("amount {0} cannot be billed in whole yen")]
    AmountOutOfRange(Decimal),
}

pub async fn handle(
    state: &AppState,
    payload: &TransactionInitializeSessionPayload,
) -> Result<TransactionWebhookResponse, ApiError> {
    let source = &payload.source_object;
    let config = channel_config(state, &source.channel.slug).await?;
    let request = register_payload(payload, &config, Utc::now().date_naive())?;
    let amount = payload.action.amount;

    if let Some(existing) = state
        .transaction_records
        .get_by_saleor_transaction_id(&payload.transaction.id)
        .await?
    {
        info!(
            "Saleor transaction {} already registered as {}, not registering again",
            existing.saleor_transaction_id, existing.atobarai_transaction_id
        );
        return Ok(redelivered(&existing, amount));
    }

    let api_client = state.api_clients.create(&config.credentials);

    let result = match api_client.register_transaction(&request).await {
        Ok(result) => result,
        Err(e) => {
            warn!("NP Atobarai registration of {} failed: {}", payload.transaction.id, e);
            return Ok(TransactionWebhookResponse {
                psp_reference: None,
                result: TransactionResultCode::ChargeFailure,
                amount,
                message: Some(e.to_string()),
            });
        }
    };

    let (code, status, message) = match result.authori_result {
        AuthorizationStatus::Ok => (
            TransactionResultCode::ChargeSuccess,
            TransactionStatus::Registered,
            None,
        ),
        AuthorizationStatus::Pending | AuthorizationStatus::InReview => (
            TransactionResultCode::ChargeActionRequired,
            TransactionStatus::UnderReview,
            Some(format!(
                "NP Atobarai is reviewing the transaction: {}",
                result.reason_codes().join(", ")
            )),
        ),
        AuthorizationStatus::Ng | AuthorizationStatus::Unknown => {
            info!(
                "NP Atobarai declined {} ({:?})",
                result.np_transaction_id, result.authori_result
            );
            return Ok(TransactionWebhookResponse {
                psp_reference: Some(result.np_transaction_id.to_string()),
                result: TransactionResultCode::ChargeFailure,
                amount,
                message: Some(format!(
                    "NP Atobarai declined the transaction: {}",
                    result.reason_codes().join(", ")
                )),
            });
        }
    };

    let record = TransactionRecord {
        status,
        ..TransactionRecord::registered(
            payload.transaction.id.clone(),
            result.np_transaction_id.clone(),
            amount,
        )
    };
    if !state.transaction_records.save(&record).await? {
        warn!(
            "Saleor transaction {} was recorded by a concurrent delivery, keeping that record",
            payload.transaction.id
        );
    }

    info!(
        "Saleor transaction {} registered as {} ({:?})",
        payload.transaction.id, result.np_transaction_id, result.authori_result
    );

    Ok(TransactionWebhookResponse {
        psp_reference: Some(result.np_transaction_id.to_string()),
        result: code,
        amount,
        message,
    })
}

/// Answer a redelivered event from the stored record without touching it.
fn redelivered(record: &TransactionRecord, amount: Decimal) -> TransactionWebhookResponse {
    let (result, message) = match record.status {
        TransactionStatus::UnderReview => (
            TransactionResultCode::ChargeActionRequired,
            Some("NP Atobarai is reviewing the transaction".to_string()),
        ),
        TransactionStatus::Cancelled => (
            TransactionResultCode::ChargeFailure,
            Some("NP Atobarai transaction was cancelled".to_string()),
        ),
        _ => (TransactionResultCode::ChargeSuccess, None),
    };
    TransactionWebhookResponse {
        psp_reference: Some(record.atobarai_transaction_id.to_string()),
        result,
        amount,
        message,
    }
}

fn register_payload(
    payload: &TransactionInitializeSessionPayload,
    config: &AppChannelConfig,
    order_date: NaiveDate,
) -> Result<RegisterTransactionPayload, SessionEventParseError> {
    let source = &payload.source_object;

    if payload.action.currency != SUPPORTED_CURRENCY {
        return Err(SessionEventParseError::UnsupportedCurrency(
            payload.action.currency.clone(),
        ));
    }

    let billed_amount = to_yen(payload.action.amount)
        .ok_or(SessionEventParseError::AmountOutOfRange(payload.action.amount))?;

    let lines = source.lines.iter().map(|line| GoodsLine {
        product_name: &line.product_name,
        product_sku: line.product_sku.as_deref(),
        unit_price: line.unit_price.gross.amount,
        quantity: line.quantity,
    });
    let shipping = source.shipping_price.as_ref().map(|price| price.gross.amount);
    let goods = build_goods(lines, shipping, billed_amount, config.sku_as_name)
        .ok_or(SessionEventParseError::AmountOutOfRange(source.total.gross.amount))?;

    Ok(RegisterTransactionPayload {
        shop_transaction_id: payload.transaction.id.clone(),
        shop_order_date: order_date.format("%Y-%m-%d").to_string(),
        settlement_type: SETTLEMENT_TYPE,
        billed_amount,
        customer: customer(source)?,
        goods,
    })
}

fn customer(source: &SourceObject) -> Result<Customer, SessionEventParseError> {
    let address = source
        .billing_address
        .as_ref()
        .ok_or_else(|| SessionEventParseError::MissingBillingAddress(source.id.clone()))?;
    let email = source
        .user_email
        .clone()
        .filter(|email| !email.is_empty())
        .ok_or_else(|| SessionEventParseError::MissingEmail(source.id.clone()))?;
    let tel = address
        .phone
        .as_deref()
        .map(domestic_phone)
        .filter(|tel| !tel.is_empty())
        .ok_or_else(|| SessionEventParseError::MissingPhone(source.id.clone()))?;

    Ok(Customer {
        customer_name: format!("{} {}", address.last_name, address.first_name)
            .trim()
            .to_string(),
        company_name: address.company_name.clone().filter(|name| !name.is_empty()),
        zip_code: address.postal_code.replace('-', ""),
        address: full_address(address),
        tel,
        email,
    })
}

/// Japanese addresses run prefecture, city, street with no separators.
fn full_address(address: &Address) -> String {
    [
        address.country_area.as_str(),
        address.city.as_str(),
        address.street_address1.as_str(),
        address.street_address2.as_deref().unwrap_or_default(),
    ]
    .concat()
}

/// `+81 90-1234-5678` becomes `09012345678`.
fn domestic_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    match phone.trim_start().strip_prefix("+81") {
        Some(_) => format!("0{}", &digits[2..]),
        None => digits,
    }
}
