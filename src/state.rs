use std::sync::Arc;

use crate::app_config::ChannelConfigRepo;
use crate::atobarai::AtobaraiApiClientFactory;
use crate::transactions::TransactionRecordRepo;

/// Shared dependencies, injected into handlers as an axum `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub saleor_app_id: String,
    pub config_api_token: String,
    pub channel_configs: Arc<dyn ChannelConfigRepo>,
    pub transaction_records: Arc<dyn TransactionRecordRepo>,
    pub api_clients: Arc<dyn AtobaraiApiClientFactory>,
}
