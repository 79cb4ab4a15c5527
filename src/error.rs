//! HTTP-facing error type shared by the webhook and configuration routes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use crate::atobarai::AtobaraiApiError;
use crate::db::StoreError;
use crate::handlers::initialize_session::SessionEventParseError;
use crate::refund::{RefundError, RefundEventParseError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Recipient ID does not match auth data ID")]
    RecipientMismatch,
    #[error("Missing or invalid bearer token")]
    Unauthorized,
    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),
    #[error(transparent)]
    InvalidRefundEvent(#[from] RefundEventParseError),
    #[error(transparent)]
    InvalidSessionEvent(#[from] SessionEventParseError),
    #[error("channel {0} is not configured")]
    ChannelNotConfigured(String),
    #[error("shipping company code is not configured for channel {0}")]
    MissingShippingCompanyCode(String),
    #[error("no NP Atobarai transaction recorded for {0}")]
    UnknownTransaction(String),
    #[error(transparent)]
    Refund(RefundError),
    #[error(transparent)]
    Partner(#[from] AtobaraiApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RecipientMismatch => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidPayload(_)
            | Self::InvalidRefundEvent(_)
            | Self::InvalidSessionEvent(_)
            | Self::ChannelNotConfigured(_)
            | Self::MissingShippingCompanyCode(_)
            | Self::UnknownTransaction(_) => StatusCode::BAD_REQUEST,
            Self::Refund(RefundError::PartnerApi(_)) | Self::Partner(_) => StatusCode::BAD_GATEWAY,
            Self::Refund(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        } else {
            warn!("Request rejected with {}: {}", status, self);
        }
        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_failure_is_a_server_error() {
        let err = ApiError::Refund(RefundError::NoMatchingStrategy {
            psp_reference: "np-1".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn partner_outage_is_a_bad_gateway() {
        let err = ApiError::Partner(AtobaraiApiError::Server { status: 503 });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn recipient_mismatch_is_forbidden() {
        assert_eq!(ApiError::RecipientMismatch.status(), StatusCode::FORBIDDEN);
    }
}
