pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::app::auth::AuthService;
use crate::app::page_cache::ResponseCache;
use crate::config::AppConfig;
use crate::infra::cache::{MemoryCache, PageCache, RedisCache};
use crate::infra::db::Db;
use crate::infra::memory::MemoryStore;
use crate::infra::postgres::PgStore;
use crate::infra::storage::MediaStorage;
use crate::infra::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub page_cache: ResponseCache,
    pub media: MediaStorage,
    pub auth: AuthService,
    pub page_size: u64,
    pub login_url: String,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Connects the configured backends: PostgreSQL and Redis when their
    /// URLs are set, in-process stand-ins otherwise.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn Store> = match &config.database_url {
            Some(database_url) => {
                let db = Db::connect(config, database_url).await?;
                db.migrate().await?;
                Arc::new(PgStore::new(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        let cache: Arc<dyn PageCache> = match &config.redis_url {
            Some(redis_url) => Arc::new(RedisCache::connect(redis_url, &config.cache_key_prefix).await?),
            None => {
                tracing::info!("REDIS_URL not set, caching pages in-process");
                Arc::new(MemoryCache::new())
            }
        };

        Ok(Self::with_backends(config, store, cache))
    }

    pub fn with_backends(config: &AppConfig, store: Arc<dyn Store>, cache: Arc<dyn PageCache>) -> Self {
        Self {
            store,
            page_cache: ResponseCache::new(
                cache,
                config.cache_key_prefix.clone(),
                Duration::from_secs(config.index_cache_ttl_seconds),
            ),
            media: MediaStorage::new(config.media_base_url.clone()),
            auth: AuthService::new(config.paseto_access_key, config.access_ttl_minutes),
            page_size: config.page_size as u64,
            login_url: config.login_url.clone(),
            admin_token: config.admin_token.clone(),
        }
    }
}
