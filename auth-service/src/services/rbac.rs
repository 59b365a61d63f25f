use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::role::{CreateRoleRequest, EditRoleRequest};
use crate::models::{is_protected_role, DefaultRole, Role, User, UserRole};
use crate::services::store::{RoleStore, UserStore};
use crate::services::{ServiceError, StoreError};

/// Flat role membership checks and role administration.
#[derive(Clone)]
pub struct AuthorizationService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
}

impl AuthorizationService {
    pub fn new(users: Arc<dyn UserStore>, roles: Arc<dyn RoleStore>) -> Self {
        Self { users, roles }
    }

    // ==================== Membership ====================

    pub async fn has_role(&self, user: &User, role_name: &str) -> Result<bool, ServiceError> {
        let roles = self.roles.list_user_roles(user.id).await?;
        Ok(roles.iter().any(|r| r.name == role_name))
    }

    /// The admin flag and `superuser` membership are independent grants.
    pub async fn is_admin(&self, user: &User) -> Result<bool, ServiceError> {
        if user.is_admin {
            return Ok(true);
        }
        self.has_role(user, DefaultRole::Superuser.as_str()).await
    }

    pub async fn require_admin(&self, user: &User) -> Result<(), ServiceError> {
        if self.is_admin(user).await? {
            Ok(())
        } else {
            tracing::warn!(user_id = %user.id, "Non-admin attempted an admin operation");
            Err(ServiceError::Forbidden("Administrator access required".to_string()))
        }
    }

    /// Pair a user with a role. Repeated assignment adds another pairing.
    pub async fn assign_role(&self, user_id: Uuid, role_name: &str) -> Result<(), ServiceError> {
        let user = self.find_user(user_id).await?;
        let role = self.find_role_by_name(role_name).await?;

        self.roles
            .add_user_role(&UserRole::new(user.id, role.id))
            .await?;

        tracing::info!(user_id = %user.id, role = %role.name, "Role assigned");
        Ok(())
    }

    pub async fn revoke_role(&self, user_id: Uuid, role_name: &str) -> Result<(), ServiceError> {
        let user = self.find_user(user_id).await?;
        let role = self.find_role_by_name(role_name).await?;

        if !self.roles.remove_user_role(user.id, role.id).await? {
            return Err(ServiceError::AssignmentNotFound);
        }

        tracing::info!(user_id = %user.id, role = %role.name, "Role revoked");
        Ok(())
    }

    /// Names of the roles a user holds, oldest role first.
    pub async fn list_user_roles(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let user = self.find_user(user_id).await?;
        let roles = self.roles.list_user_roles(user.id).await?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    // ==================== Role administration ====================

    pub async fn list_roles(&self) -> Result<Vec<Role>, ServiceError> {
        Ok(self.roles.list_all().await?)
    }

    pub async fn create_role(&self, req: CreateRoleRequest) -> Result<Role, ServiceError> {
        req.validate()?;

        if self.roles.find_by_name(&req.name).await?.is_some() {
            return Err(ServiceError::DuplicateRole);
        }

        let role = Role::new(req.name, req.description);
        self.roles
            .create(&role)
            .await
            .map_err(|e| ServiceError::from_store(e, ServiceError::DuplicateRole))?;

        tracing::info!(role_id = %role.id, role = %role.name, "Role created");
        Ok(role)
    }

    /// Rename a role or change its description. Protected roles keep their
    /// names and no role may take a protected name.
    pub async fn edit_role(&self, role_id: Uuid, req: EditRoleRequest) -> Result<Role, ServiceError> {
        req.validate()?;

        let mut role = self
            .roles
            .find_by_id(role_id)
            .await?
            .ok_or(ServiceError::RoleNotFound)?;

        if let Some(name) = req.name {
            if name != role.name {
                if role.is_protected() {
                    return Err(ServiceError::ProtectedRole(role.name));
                }
                if is_protected_role(&name) {
                    return Err(ServiceError::ProtectedRole(name));
                }
                role.name = name;
            }
        }
        if let Some(description) = req.description {
            role.description = Some(description);
        }

        self.roles.update(&role).await.map_err(|e| match e {
            StoreError::NotFound => ServiceError::RoleNotFound,
            other => ServiceError::from_store(other, ServiceError::DuplicateRole),
        })?;

        tracing::info!(role_id = %role.id, role = %role.name, "Role updated");
        Ok(role)
    }

    pub async fn delete_role(&self, role_id: Uuid) -> Result<(), ServiceError> {
        let role = self
            .roles
            .find_by_id(role_id)
            .await?
            .ok_or(ServiceError::RoleNotFound)?;

        if role.is_protected() {
            return Err(ServiceError::ProtectedRole(role.name));
        }

        if !self.roles.delete(role.id).await? {
            return Err(ServiceError::RoleNotFound);
        }

        tracing::info!(role_id = %role.id, role = %role.name, "Role deleted");
        Ok(())
    }

    /// Create any missing built-in role. Returns how many were created.
    pub async fn ensure_default_roles(&self) -> Result<usize, ServiceError> {
        let mut created = 0;
        for default in DefaultRole::ALL {
            if self.roles.find_by_name(default.as_str()).await?.is_some() {
                continue;
            }

            let role = Role::new(
                default.as_str().to_string(),
                Some(default.description().to_string()),
            );
            match self.roles.create(&role).await {
                Ok(()) => created += 1,
                // Another instance seeded it first
                Err(StoreError::UniqueViolation(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        if created > 0 {
            tracing::info!(created, "Default roles seeded");
        }
        Ok(created)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Role, ServiceError> {
        self.roles
            .find_by_name(name)
            .await?
            .ok_or(ServiceError::RoleNotFound)
    }
}
