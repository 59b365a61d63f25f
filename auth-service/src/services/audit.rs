use std::sync::Arc;
use uuid::Uuid;

use crate::models::{AuthHistory, AuthHistoryResponse, DeviceClass, User};
use crate::services::store::AuthHistoryStore;
use crate::services::ServiceError;

/// Column width of `auth_history.ip_address`.
const MAX_IP_ADDRESS_LEN: usize = 100;

/// Append-only log of successful logins.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuthHistoryStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuthHistoryStore>) -> Self {
        Self { store }
    }

    /// Append one login event for `user`.
    pub async fn record(
        &self,
        user: &User,
        user_agent: &str,
        ip_address: Option<&str>,
        device: DeviceClass,
    ) -> Result<AuthHistory, ServiceError> {
        let ip_address = ip_address
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(|ip| ip.chars().take(MAX_IP_ADDRESS_LEN).collect::<String>());

        let entry = AuthHistory::new(user.id, user_agent.to_string(), ip_address, device);
        self.store.insert(&entry).await?;

        tracing::debug!(
            user_id = %user.id,
            device = device.as_str(),
            "Auth history recorded"
        );

        Ok(entry)
    }

    /// History of `owner_id`, oldest first. Only the owner may read it.
    pub async fn list(
        &self,
        requester: &User,
        owner_id: Uuid,
    ) -> Result<Vec<AuthHistoryResponse>, ServiceError> {
        if requester.id != owner_id {
            tracing::warn!(
                requester_id = %requester.id,
                owner_id = %owner_id,
                "Rejected auth history read for another user"
            );
            return Err(ServiceError::Forbidden(
                "Auth history is only visible to its owner".to_string(),
            ));
        }

        let entries = self.store.list_for_user(owner_id).await?;
        Ok(entries.into_iter().map(AuthHistoryResponse::from).collect())
    }
}
