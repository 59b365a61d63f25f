pub mod config;
pub mod db;
pub mod dtos;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::services::{
    AuditRecorder, AuthHistoryStore, AuthorizationService, Database, JwtService, RedisService,
    RevocationLedger, RoleStore, SessionManager, StoreIdentityProvider, UserStore,
};

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub sessions: SessionManager,
    pub authz: AuthorizationService,
    pub audit: AuditRecorder,
    pub ledger: Arc<dyn RevocationLedger>,
}

impl AppState {
    /// Wire the services over the given collaborators.
    pub fn from_parts(
        config: &AuthConfig,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        history: Arc<dyn AuthHistoryStore>,
        ledger: Arc<dyn RevocationLedger>,
    ) -> Result<Self, anyhow::Error> {
        let jwt = JwtService::new(&config.jwt)?;
        let audit = AuditRecorder::new(history);
        let identity = Arc::new(StoreIdentityProvider::new(users.clone()));

        let sessions = SessionManager::new(
            users.clone(),
            identity,
            ledger.clone(),
            jwt,
            config.hashing.clone(),
            audit.clone(),
        );
        let authz = AuthorizationService::new(users, roles);

        Ok(Self {
            config: config.clone(),
            sessions,
            authz,
            audit,
            ledger,
        })
    }

    /// Wire the services over PostgreSQL and Redis.
    pub async fn connect(config: &AuthConfig) -> Result<(Self, Database), anyhow::Error> {
        let pool = db::create_pool(&config.database).await?;
        let database = Database::new(pool);
        let ledger = Arc::new(RedisService::new(&config.redis).await?);

        let store = Arc::new(database.clone());
        let state = Self::from_parts(config, store.clone(), store.clone(), store, ledger)?;
        Ok((state, database))
    }
}
