use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{AuthHistory, Role, User, UserRole};
use crate::services::error::StoreError;
use crate::services::store::{AuthHistoryStore, RoleStore, UserStore};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    user_roles: Vec<UserRole>,
    auth_history: Vec<AuthHistory>,
}

/// In-process store with the same uniqueness rules as the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Memory store mutex poisoned: {}", e)))
    }
}

fn check_user_unique(users: &[User], user: &User) -> Result<(), StoreError> {
    for other in users.iter().filter(|u| u.id != user.id) {
        if other.email == user.email {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }
        if other.refresh_token == user.refresh_token {
            return Err(StoreError::UniqueViolation("users_refresh_token_key".to_string()));
        }
    }
    Ok(())
}

fn check_role_unique(roles: &[Role], role: &Role) -> Result<(), StoreError> {
    if roles.iter().any(|r| r.id != role.id && r.name == role.name) {
        return Err(StoreError::UniqueViolation("roles_name_key".to_string()));
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.id == user.id) {
            return Err(StoreError::UniqueViolation("users_pkey".to_string()));
        }
        check_user_unique(&tables.users, user)?;
        tables.users.push(user.clone());
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, refresh_token: &str) -> Result<(), StoreError> {
        self.update_identity(id, None, None, refresh_token).await
    }

    async fn update_identity(
        &self,
        id: Uuid,
        email: Option<&str>,
        password_hash: Option<&str>,
        refresh_token: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let mut next = tables
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        if let Some(email) = email {
            next.email = email.to_string();
        }
        if let Some(password_hash) = password_hash {
            next.password_hash = password_hash.to_string();
        }
        next.refresh_token = refresh_token.to_string();

        check_user_unique(&tables.users, &next)?;
        if let Some(slot) = tables.users.iter_mut().find(|u| u.id == id) {
            *slot = next;
        }
        Ok(())
    }

    async fn set_account_flags(
        &self,
        id: Uuid,
        is_admin: bool,
        active: bool,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.is_admin = is_admin;
        user.active = active;
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.lock()?.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        Ok(self.lock()?.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, role: &Role) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.roles.iter().any(|r| r.id == role.id) {
            return Err(StoreError::UniqueViolation("roles_pkey".to_string()));
        }
        check_role_unique(&tables.roles, role)?;
        tables.roles.push(role.clone());
        Ok(())
    }

    async fn update(&self, role: &Role) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        check_role_unique(&tables.roles, role)?;
        let slot = tables
            .roles
            .iter_mut()
            .find(|r| r.id == role.id)
            .ok_or(StoreError::NotFound)?;
        *slot = role.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        let before = tables.roles.len();
        tables.roles.retain(|r| r.id != id);
        if tables.roles.len() == before {
            return Ok(false);
        }
        tables.user_roles.retain(|ur| ur.role_id != id);
        Ok(true)
    }

    async fn list_all(&self) -> Result<Vec<Role>, StoreError> {
        let mut roles = self.lock()?.roles.clone();
        roles.sort_by_key(|r| r.created);
        Ok(roles)
    }

    async fn add_user_role(&self, pairing: &UserRole) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.users.iter().any(|u| u.id == pairing.user_id)
            || !tables.roles.iter().any(|r| r.id == pairing.role_id)
        {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "user_role references a missing user or role"
            )));
        }
        tables.user_roles.push(pairing.clone());
        Ok(())
    }

    async fn remove_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        match tables
            .user_roles
            .iter()
            .position(|ur| ur.user_id == user_id && ur.role_id == role_id)
        {
            Some(index) => {
                tables.user_roles.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError> {
        let tables = self.lock()?;
        let mut roles: Vec<Role> = tables
            .roles
            .iter()
            .filter(|r| {
                tables
                    .user_roles
                    .iter()
                    .any(|ur| ur.user_id == user_id && ur.role_id == r.id)
            })
            .cloned()
            .collect();
        roles.sort_by_key(|r| r.created);
        Ok(roles)
    }
}

#[async_trait]
impl AuthHistoryStore for MemoryStore {
    async fn insert(&self, entry: &AuthHistory) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.users.iter().any(|u| u.id == entry.user_id) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "auth_history references a missing user"
            )));
        }
        tables.auth_history.push(entry.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AuthHistory>, StoreError> {
        let mut entries: Vec<AuthHistory> = self
            .lock()?
            .auth_history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|h| h.created);
        Ok(entries)
    }
}
