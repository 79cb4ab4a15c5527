//! Per sales channel NP Atobarai configuration.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::atobarai::{AtobaraiCredentials, AtobaraiEnvironment, ShippingCompanyCode};
use crate::db::{AppDb, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppChannelConfig {
    pub channel_slug: String,
    pub name: String,
    pub credentials: AtobaraiCredentials,
    /// Required once orders ship; refunds after fulfillment fail without it.
    pub shipping_company_code: Option<ShippingCompanyCode>,
    /// Send product SKUs instead of names as `goods_name`.
    #[serde(default)]
    pub sku_as_name: bool,
}

#[async_trait]
pub trait ChannelConfigRepo: Send + Sync {
    async fn get(&self, channel_slug: &str) -> Result<Option<AppChannelConfig>, StoreError>;
    async fn upsert(&self, config: &AppChannelConfig) -> Result<(), StoreError>;
}

// ============================================================================
// Postgres
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ChannelConfigRow {
    channel_slug: String,
    name: String,
    merchant_code: String,
    terminal_id: String,
    secret_sp_code: String,
    environment: String,
    shipping_company_code: Option<String>,
    sku_as_name: bool,
}

impl TryFrom<ChannelConfigRow> for AppChannelConfig {
    type Error = StoreError;

    fn try_from(row: ChannelConfigRow) -> Result<Self, Self::Error> {
        let environment: AtobaraiEnvironment = row.environment.parse().map_err(StoreError::Corrupt)?;
        Ok(Self {
            channel_slug: row.channel_slug,
            name: row.name,
            credentials: AtobaraiCredentials {
                merchant_code: row.merchant_code,
                terminal_id: row.terminal_id,
                secret_sp_code: row.secret_sp_code,
                environment,
            },
            shipping_company_code: row.shipping_company_code.map(ShippingCompanyCode::new),
            sku_as_name: row.sku_as_name,
        })
    }
}

pub struct PgChannelConfigRepo {
    pool: AppDb,
}

impl PgChannelConfigRepo {
    pub fn new(pool: AppDb) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelConfigRepo for PgChannelConfigRepo {
    async fn get(&self, channel_slug: &str) -> Result<Option<AppChannelConfig>, StoreError> {
        let row: Option<ChannelConfigRow> = sqlx::query_as(
            r#"
            SELECT channel_slug, name, merchant_code, terminal_id, secret_sp_code,
                   environment, shipping_company_code, sku_as_name
            FROM channel_configs
            WHERE channel_slug = $1
            "#,
        )
        .bind(channel_slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AppChannelConfig::try_from).transpose()
    }

    async fn upsert(&self, config: &AppChannelConfig) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO channel_configs
                (channel_slug, name, merchant_code, terminal_id, secret_sp_code,
                 environment, shipping_company_code, sku_as_name, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (channel_slug) DO UPDATE SET
                name = EXCLUDED.name,
                merchant_code = EXCLUDED.merchant_code,
                terminal_id = EXCLUDED.terminal_id,
                secret_sp_code = EXCLUDED.secret_sp_code,
                environment = EXCLUDED.environment,
                shipping_company_code = EXCLUDED.shipping_company_code,
                sku_as_name = EXCLUDED.sku_as_name,
                updated_at = NOW()
            "#,
        )
        .bind(&config.channel_slug)
        .bind(&config.name)
        .bind(&config.credentials.merchant_code)
        .bind(&config.credentials.terminal_id)
        .bind(&config.credentials.secret_sp_code)
        .bind(config.credentials.environment.as_str())
        .bind(config.shipping_company_code.as_ref().map(ShippingCompanyCode::as_str))
        .bind(config.sku_as_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// In memory
// ============================================================================

#[derive(Default)]
pub struct InMemoryChannelConfigRepo {
    configs: RwLock<HashMap<String, AppChannelConfig>>,
}

impl InMemoryChannelConfigRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelConfigRepo for InMemoryChannelConfigRepo {
    async fn get(&self, channel_slug: &str) -> Result<Option<AppChannelConfig>, StoreError> {
        let configs = self
            .configs
            .read()
            .map_err(|_| StoreError::Corrupt("channel config lock poisoned".into()))?;
        Ok(configs.get(channel_slug).cloned())
    }

    async fn upsert(&self, config: &AppChannelConfig) -> Result<(), StoreError> {
        self.configs
            .write()
            .map_err(|_| StoreError::Corrupt("channel config lock poisoned".into()))?
            .insert(config.channel_slug.clone(), config.clone());
        Ok(())
    }
}
