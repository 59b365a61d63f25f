//! Shared setup for auth-service integration tests.
//!
//! Builds the full service graph over `MemoryStore` and `InMemoryLedger`
//! so the flows run without PostgreSQL or Redis.

#![allow(dead_code)]

use auth_service::{
    config::{
        AuthConfig, DatabaseConfig, Environment, HashingConfig, JwtConfig, RedisConfig,
    },
    dtos::{LoginContext, LoginRequest, RegisterRequest, TokenResponse},
    services::{AuthHistoryStore, InMemoryLedger, MemoryStore},
    AppState,
};
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "auth-service-test".to_string(),
        service_version: "test".to_string(),
        database: DatabaseConfig {
            url: "postgres://localhost/auth_test".to_string(),
            max_connections: 2,
            min_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://localhost:6379/0".to_string(),
        },
        jwt: JwtConfig {
            secret_key: TEST_JWT_SECRET.to_string(),
            access_token_expires_hours: 1,
            refresh_token_expires_days: 1,
        },
        // Low iteration counts keep the suite fast
        hashing: HashingConfig {
            min_iterations: 1_000,
            max_iterations: 2_000,
        },
    }
}

/// Service graph plus handles on the in-memory collaborators.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub ledger: Arc<InMemoryLedger>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_history(store.clone(), store)
    }

    /// Same graph, but auth history goes to `history`.
    pub fn with_history(store: Arc<MemoryStore>, history: Arc<dyn AuthHistoryStore>) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let state = AppState::from_parts(
            &test_config(),
            store.clone(),
            store.clone(),
            history,
            ledger.clone(),
        )
        .expect("Failed to build app state");

        Self {
            state,
            store,
            ledger,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> TokenResponse {
        self.state
            .sessions
            .register(RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
                password_confirmation: password.to_string(),
            })
            .await
            .expect("Registration failed")
    }

    pub async fn login(&self, email: &str, password: &str) -> TokenResponse {
        self.state
            .sessions
            .login(login_request(email, password), &desktop_context())
            .await
            .expect("Login failed")
    }
}

pub fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn desktop_context() -> LoginContext {
    LoginContext::new(DESKTOP_UA, Some("203.0.113.7".to_string()))
}
