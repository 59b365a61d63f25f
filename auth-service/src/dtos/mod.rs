pub mod auth;
pub mod role;

pub use auth::{
    AccessTokenResponse, ChangeIdentityRequest, LoginContext, LoginRequest, RegisterRequest,
    TokenResponse,
};
pub use role::{CreateRoleRequest, EditRoleRequest};
