use async_trait::async_trait;
use std::sync::Arc;

use crate::models::User;
use crate::services::jwt::TokenClaims;
use crate::services::store::UserStore;
use crate::services::ServiceError;

/// Resolves verified token claims to the user they name.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, claims: &TokenClaims) -> Result<User, ServiceError>;
}

/// Looks the subject up by email in the user store.
#[derive(Clone)]
pub struct StoreIdentityProvider {
    users: Arc<dyn UserStore>,
}

impl StoreIdentityProvider {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn resolve(&self, claims: &TokenClaims) -> Result<User, ServiceError> {
        self.users
            .find_by_email(&claims.sub)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }
}
