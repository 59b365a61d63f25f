//! User model - identity records owned by the auth store.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity.
///
/// `password_hash` is always a credential digest, never plaintext.
/// `refresh_token` is the single live refresh token for this user; it is
/// overwritten whenever a new session is minted.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub refresh_token: String,
    pub is_admin: bool,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Create a new, active, non-admin user.
    pub fn new(email: String, password_hash: String, refresh_token: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            refresh_token,
            is_admin: false,
            active: true,
            registered_at: Utc::now(),
        }
    }

    /// Create a new administrator.
    pub fn new_admin(email: String, password_hash: String, refresh_token: String) -> Self {
        Self {
            is_admin: true,
            ..Self::new(email, password_hash, refresh_token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_active_and_not_admin() {
        let user = User::new(
            "alice@example.com".to_string(),
            "sha256$1$00$00".to_string(),
            "token".to_string(),
        );
        assert!(user.active);
        assert!(!user.is_admin);
    }
}
