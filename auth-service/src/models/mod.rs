pub mod auth_history;
pub mod role;
pub mod user;

pub use auth_history::{AuthHistory, AuthHistoryResponse, DeviceClass};
pub use role::{is_protected_role, DefaultRole, Role, UserRole};
pub use user::User;
