//! # NP Atobarai App
//!
//! Saleor payment app serving the NP Atobarai webhooks.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and request/response lifecycle
//! - SQLx stores channel configs and transaction records in PostgreSQL
//! - reqwest talks to the NP Atobarai REST API, one client per channel config

use std::sync::Arc;

use tracing::info;

use np_atobarai_app::app_config::PgChannelConfigRepo;
use np_atobarai_app::atobarai::client::HttpAtobaraiApiClientFactory;
use np_atobarai_app::config::Settings;
use np_atobarai_app::state::AppState;
use np_atobarai_app::transactions::PgTransactionRecordRepo;
use np_atobarai_app::{create_app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "np_atobarai_app=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting NP Atobarai app");

    let settings = Settings::from_env()?;

    // Connects and applies migrations
    let app_db = db::connect(&settings.database_url, settings.database_max_connections).await?;
    info!("Connected to application database, migrations complete");

    let state = AppState {
        saleor_app_id: settings.saleor_app_id,
        config_api_token: settings.config_api_token,
        channel_configs: Arc::new(PgChannelConfigRepo::new(app_db.clone())),
        transaction_records: Arc::new(PgTransactionRecordRepo::new(app_db)),
        api_clients: Arc::new(HttpAtobaraiApiClientFactory::new(
            settings.atobarai_http_timeout,
        )?),
    };

    let app = create_app(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!("Listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
