use anyhow::Result;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::infra::cache::PageCache;

/// Full-response cache for a view: a hit returns the body rendered on the
/// first request after the last miss, unchanged, until the TTL lapses or the
/// cache is cleared.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Arc<dyn PageCache>,
    key_prefix: String,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(cache: Arc<dyn PageCache>, key_prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            key_prefix: key_prefix.into(),
            ttl,
        }
    }

    /// Cache key for a view and its request target (path plus query string),
    /// so each page of a feed is cached on its own.
    pub fn key(&self, view: &str, path_and_query: &str) -> String {
        let digest = Sha256::digest(path_and_query.as_bytes());
        format!("{}{}:{}", self.key_prefix, view, hex::encode(digest))
    }

    /// Returns the cached body for `key`, or renders, stores and returns a
    /// fresh one. Cache failures degrade to rendering.
    pub async fn get_or_render<F, Fut>(&self, key: &str, render: F) -> Result<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes>>,
    {
        match self.cache.get(key).await {
            Ok(Some(body)) => {
                debug!(key, "page cache hit");
                return Ok(body);
            }
            Ok(None) => debug!(key, "page cache miss"),
            Err(err) => warn!(error = ?err, key, "failed to read page cache"),
        }

        let body = render().await?;
        if let Err(err) = self.cache.set(key, body.clone(), self.ttl).await {
            warn!(error = ?err, key, "failed to write page cache");
        }
        Ok(body)
    }

    pub async fn clear(&self) -> Result<()> {
        self.cache.clear().await
    }

    pub async fn ping(&self) -> Result<()> {
        self.cache.ping().await
    }
}
