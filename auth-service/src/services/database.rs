//! PostgreSQL store for users, roles and auth history.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::models::{AuthHistory, Role, User, UserRole};
use crate::services::error::StoreError;
use crate::services::store::{AuthHistoryStore, RoleStore, UserStore};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(
                db_err.constraint().unwrap_or("unknown").to_string(),
            );
        }
    }
    StoreError::Backend(anyhow::anyhow!(err))
}

// ==================== User Operations ====================

#[async_trait]
impl UserStore for Database {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, refresh_token, is_admin, active, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(user.is_admin)
        .bind(user.active)
        .bind(user.registered_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, refresh_token: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(refresh_token)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_identity(
        &self,
        id: Uuid,
        email: Option<&str>,
        password_hash: Option<&str>,
        refresh_token: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                refresh_token = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(refresh_token)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_account_flags(
        &self,
        id: Uuid,
        is_admin: bool,
        active: bool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET is_admin = $2, active = $3 WHERE id = $1")
            .bind(id)
            .bind(is_admin)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ==================== Role Operations ====================

#[async_trait]
impl RoleStore for Database {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn create(&self, role: &Role) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO roles (id, name, description, created) VALUES ($1, $2, $3, $4)")
            .bind(role.id)
            .bind(&role.name)
            .bind(&role.description)
            .bind(role.created)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn update(&self, role: &Role) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE roles SET name = $2, description = $3 WHERE id = $1")
            .bind(role.id)
            .bind(&role.name)
            .bind(&role.description)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        // user_role rows go with the role via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<Role>, StoreError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY created")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn add_user_role(&self, pairing: &UserRole) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO user_role (id, user_id, role_id) VALUES ($1, $2, $3)")
            .bind(pairing.id)
            .bind(pairing.user_id)
            .bind(pairing.role_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn remove_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_role
            WHERE id = (
                SELECT id FROM user_role WHERE user_id = $1 AND role_id = $2 LIMIT 1
            )
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError> {
        sqlx::query_as::<_, Role>(
            r#"
            SELECT r.* FROM roles r
            WHERE EXISTS (
                SELECT 1 FROM user_role ur WHERE ur.role_id = r.id AND ur.user_id = $1
            )
            ORDER BY r.created
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }
}

// ==================== Auth History Operations ====================

#[async_trait]
impl AuthHistoryStore for Database {
    async fn insert(&self, entry: &AuthHistory) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO auth_history (id, user_id, user_agent, ip_address, device, created)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.user_agent)
        .bind(&entry.ip_address)
        .bind(&entry.device)
        .bind(entry.created)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AuthHistory>, StoreError> {
        sqlx::query_as::<_, AuthHistory>(
            "SELECT * FROM auth_history WHERE user_id = $1 ORDER BY created",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }
}
