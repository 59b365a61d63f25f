use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::{aio::ConnectionManager, Client};
use std::collections::HashMap;
use std::sync::Mutex;

/// Blocklist of revoked token ids. Entries expire after their TTL.
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    async fn revoke(&self, jti: &str, ttl_seconds: i64) -> Result<(), anyhow::Error>;
    async fn is_revoked(&self, jti: &str) -> Result<bool, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

fn blocklist_key(jti: &str) -> String {
    format!("blocklist:{}", jti)
}

#[derive(Clone)]
pub struct RedisService {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisService {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!("Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // ConnectionManager reconnects on its own
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl RevocationLedger for RedisService {
    /// Record a revoked token id with an expiry
    async fn revoke(&self, jti: &str, ttl_seconds: i64) -> Result<(), anyhow::Error> {
        if ttl_seconds <= 0 {
            anyhow::bail!("Revocation TTL must be positive, got {}", ttl_seconds);
        }

        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(blocklist_key(jti))
            .arg("")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.manager.clone();
        let exists: bool = redis::cmd("EXISTS")
            .arg(blocklist_key(jti))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check blocklist: {}", e))?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// Process-local ledger for tests and single-node development.
#[derive(Default)]
pub struct InMemoryLedger {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|exp| **exp > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RevocationLedger for InMemoryLedger {
    async fn revoke(&self, jti: &str, ttl_seconds: i64) -> Result<(), anyhow::Error> {
        if ttl_seconds <= 0 {
            anyhow::bail!("Revocation TTL must be positive, got {}", ttl_seconds);
        }

        let expires_at = Utc::now() + Duration::seconds(ttl_seconds);
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Ledger mutex poisoned: {}", e))?;
        let now = Utc::now();
        entries.retain(|_, exp| *exp > now);
        entries.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, anyhow::Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Ledger mutex poisoned: {}", e))?;
        Ok(entries.get(jti).is_some_and(|exp| *exp > Utc::now()))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
