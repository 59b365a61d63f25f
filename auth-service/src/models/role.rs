//! Role model - named roles and their user pairings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Built-in roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultRole {
    Guest,
    Superuser,
    Staff,
}

impl DefaultRole {
    pub const ALL: [DefaultRole; 3] = [DefaultRole::Guest, DefaultRole::Superuser, DefaultRole::Staff];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultRole::Guest => "guest",
            DefaultRole::Superuser => "superuser",
            DefaultRole::Staff => "staff",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DefaultRole::Guest => "Unprivileged visitor",
            DefaultRole::Superuser => "Full administrative access",
            DefaultRole::Staff => "Service staff member",
        }
    }
}

/// Protected role names cannot be renamed or deleted.
pub fn is_protected_role(name: &str) -> bool {
    DefaultRole::ALL.iter().any(|role| role.as_str() == name)
}

/// Role entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
}

impl Role {
    /// Create a new role.
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            created: Utc::now(),
        }
    }

    pub fn is_protected(&self) -> bool {
        is_protected_role(&self.name)
    }
}

/// User-role pairing. The pair carries no uniqueness constraint.
#[derive(Debug, Clone, FromRow)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
}

impl UserRole {
    pub fn new(user_id: Uuid, role_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            role_id,
        }
    }
}
