//! Services layer for auth-service.
//!
//! Credential handling, token minting and revocation, session flows,
//! role-based authorization and the login audit trail, plus the store
//! collaborators they run against.

mod audit;
mod database;
pub mod error;
mod identity;
mod jwt;
mod memory;
mod rbac;
pub mod redis;
mod session;
pub mod store;

pub use audit::AuditRecorder;
pub use database::Database;
pub use error::{ServiceError, StoreError};
pub use identity::{IdentityProvider, StoreIdentityProvider};
pub use jwt::{IssuedToken, JwtService, TokenClaims, TokenType};
pub use memory::MemoryStore;
pub use rbac::AuthorizationService;
pub use redis::{InMemoryLedger, RedisService, RevocationLedger};
pub use session::SessionManager;
pub use store::{AuthHistoryStore, RoleStore, UserStore};
