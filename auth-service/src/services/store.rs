//! Persistence collaborators consumed by the session, authorization and
//! audit services. Every call is a single atomic write on the backing store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AuthHistory, Role, User, UserRole};
use crate::services::error::StoreError;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with `UniqueViolation` when the email or refresh token is taken.
    async fn create(&self, user: &User) -> Result<(), StoreError>;

    /// Replaces only the stored refresh token.
    /// Fails with `NotFound` when no row has `id`.
    async fn set_refresh_token(&self, id: Uuid, refresh_token: &str) -> Result<(), StoreError>;

    /// Writes the provided email and password hash together with the new
    /// refresh token. Absent fields keep their stored values.
    async fn update_identity(
        &self,
        id: Uuid,
        email: Option<&str>,
        password_hash: Option<&str>,
        refresh_token: &str,
    ) -> Result<(), StoreError>;

    /// Writes the admin and active flags only.
    async fn set_account_flags(
        &self,
        id: Uuid,
        is_admin: bool,
        active: bool,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError>;
    async fn create(&self, role: &Role) -> Result<(), StoreError>;
    async fn update(&self, role: &Role) -> Result<(), StoreError>;

    /// Deletes the role and its pairings. Returns false when nothing matched.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// All roles ordered by creation.
    async fn list_all(&self) -> Result<Vec<Role>, StoreError>;

    async fn add_user_role(&self, pairing: &UserRole) -> Result<(), StoreError>;

    /// Removes one pairing of `user_id` with `role_id`. Returns false when
    /// there was none.
    async fn remove_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, StoreError>;

    /// Distinct roles held by a user, ordered by role creation.
    async fn list_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError>;
}

#[async_trait]
pub trait AuthHistoryStore: Send + Sync {
    async fn insert(&self, entry: &AuthHistory) -> Result<(), StoreError>;

    /// Entries for one user, oldest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AuthHistory>, StoreError>;
}
