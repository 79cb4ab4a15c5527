//! Channel configuration routes, guarded by `CONFIG_API_TOKEN`.
//!
//! PUT  /api/config/channels/{slug}     - Create or replace a channel's NP Atobarai config
//! GET  /api/config/channels/{slug}     - Read a channel config (secret omitted)
//! POST /api/config/verify-credentials  - Check credentials against NP Atobarai

use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Extension, Json, Router};
use tracing::info;

use crate::atobarai::{AtobaraiApiError, AtobaraiCredentials};
use crate::error::ApiError;
use crate::models::{ApiResponse, ChannelConfigInput, ChannelConfigView, CredentialsCheckResponse};
use crate::state::AppState;

/// Build the configuration router.
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/config/channels/{slug}",
            put(put_channel_config).get(get_channel_config),
        )
        .route("/api/config/verify-credentials", post(verify_credentials))
}

fn authorize(headers: &HeaderMap, state: &AppState) -> Result<(), ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if token == state.config_api_token => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

async fn put_channel_config(
    Extension(state): Extension<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ChannelConfigInput>,
) -> Result<Json<ApiResponse<ChannelConfigView>>, ApiError> {
    authorize(&headers, &state)?;

    let config = input.into_config(slug);
    state.channel_configs.upsert(&config).await?;

    info!(
        "Channel {} configured for {} ({})",
        config.channel_slug,
        config.credentials.merchant_code,
        config.credentials.environment.as_str()
    );

    Ok(Json(ApiResponse {
        data: ChannelConfigView::from(&config),
        message: "Channel configuration saved".to_string(),
    }))
}

async fn get_channel_config(
    Extension(state): Extension<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authorize(&headers, &state)?;

    let response = match state.channel_configs.get(&slug).await? {
        Some(config) => Json(ApiResponse {
            data: ChannelConfigView::from(&config),
            message: "Channel configuration retrieved".to_string(),
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": format!("channel {} is not configured", slug) })),
        )
            .into_response(),
    };
    Ok(response)
}

async fn verify_credentials(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(credentials): Json<AtobaraiCredentials>,
) -> Result<(StatusCode, Json<ApiResponse<CredentialsCheckResponse>>), ApiError> {
    authorize(&headers, &state)?;

    let api_client = state.api_clients.create(&credentials);
    let (status, valid, message) = match api_client.verify_credentials().await {
        Ok(()) => (StatusCode::OK, true, "Credentials accepted"),
        Err(AtobaraiApiError::Unauthorized) => {
            (StatusCode::BAD_REQUEST, false, "NP Atobarai rejected the credentials")
        }
        Err(e) => return Err(ApiError::Partner(e)),
    };

    info!(
        "Credentials for {} checked: valid={}",
        credentials.merchant_code, valid
    );

    Ok((
        status,
        Json(ApiResponse {
            data: CredentialsCheckResponse { valid },
            message: message.to_string(),
        }),
    ))
}
