//! Webhook use cases, one module per Saleor event.
//!
//! - `refund_requested`: `TRANSACTION_REFUND_REQUESTED`, delegates to [`crate::refund`]
//! - `initialize_session`: `TRANSACTION_INITIALIZE_SESSION`, registers the NP transaction
//! - `fulfillment`: `FULFILLMENT_TRACKING_NUMBER_UPDATED`, reports the shipment
//!
//! Handlers take the shared [`AppState`] and an already-verified payload; the
//! routes own recipient verification and the HTTP envelope.

pub mod fulfillment;
pub mod initialize_session;
pub mod refund_requested;

use crate::app_config::AppChannelConfig;
use crate::error::ApiError;
use crate::models::WithRecipient;
use crate::state::AppState;

/// Reject payloads addressed to another app installation.
pub fn verify_recipient<P: WithRecipient>(state: &AppState, payload: &P) -> Result<(), ApiError> {
    match payload.recipient_id() {
        Some(id) if id == state.saleor_app_id => Ok(()),
        _ => Err(ApiError::RecipientMismatch),
    }
}

async fn channel_config(state: &AppState, channel_slug: &str) -> Result<AppChannelConfig, ApiError> {
    state
        .channel_configs
        .get(channel_slug)
        .await?
        .ok_or_else(|| ApiError::ChannelNotConfigured(channel_slug.to_string()))
}
