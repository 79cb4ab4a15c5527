//! Saleor webhook routes.
//!
//! POST /api/webhooks/saleor/transaction-refund-requested         - Refund an NP transaction
//! POST /api/webhooks/saleor/transaction-initialize-session       - Register an NP transaction
//! POST /api/webhooks/saleor/fulfillment-tracking-number-updated  - Report a shipment

use axum::routing::post;
use axum::{Extension, Json, Router};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::{self, verify_recipient};
use crate::models::{
    FulfillmentReportResponse, FulfillmentTrackingNumberUpdatedPayload,
    TransactionInitializeSessionPayload, TransactionRefundRequestedPayload,
    TransactionWebhookResponse,
};
use crate::state::AppState;

/// Build the webhooks router.
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/webhooks/saleor/transaction-refund-requested",
            post(transaction_refund_requested),
        )
        .route(
            "/api/webhooks/saleor/transaction-initialize-session",
            post(transaction_initialize_session),
        )
        .route(
            "/api/webhooks/saleor/fulfillment-tracking-number-updated",
            post(fulfillment_tracking_number_updated),
        )
}

async fn transaction_refund_requested(
    Extension(state): Extension<AppState>,
    Json(payload): Json<TransactionRefundRequestedPayload>,
) -> Result<Json<TransactionWebhookResponse>, ApiError> {
    let span = info_span!("webhook", event = "TRANSACTION_REFUND_REQUESTED", delivery_id = %Uuid::new_v4());
    async move {
        verify_recipient(&state, &payload)?;
        let response = handlers::refund_requested::handle(&state, &payload).await?;
        info!("Refund answered with {:?}", response.result);
        Ok::<_, ApiError>(Json(response))
    }
    .instrument(span)
    .await
}

async fn transaction_initialize_session(
    Extension(state): Extension<AppState>,
    Json(payload): Json<TransactionInitializeSessionPayload>,
) -> Result<Json<TransactionWebhookResponse>, ApiError> {
    let span = info_span!("webhook", event = "TRANSACTION_INITIALIZE_SESSION", delivery_id = %Uuid::new_v4());
    async move {
        verify_recipient(&state, &payload)?;
        let response = handlers::initialize_session::handle(&state, &payload).await?;
        info!("Session answered with {:?}", response.result);
        Ok::<_, ApiError>(Json(response))
    }
    .instrument(span)
    .await
}

async fn fulfillment_tracking_number_updated(
    Extension(state): Extension<AppState>,
    Json(payload): Json<FulfillmentTrackingNumberUpdatedPayload>,
) -> Result<Json<FulfillmentReportResponse>, ApiError> {
    let span = info_span!("webhook", event = "FULFILLMENT_TRACKING_NUMBER_UPDATED", delivery_id = %Uuid::new_v4());
    async move {
        verify_recipient(&state, &payload)?;
        let response = handlers::fulfillment::handle(&state, &payload).await?;
        Ok::<_, ApiError>(Json(response))
    }
    .instrument(span)
    .await
}
