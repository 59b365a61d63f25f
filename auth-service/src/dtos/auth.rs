use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::DeviceClass;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[serde(alias = "password2")]
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Fields a signed-in user may change about themselves. Absent fields are
/// left as they are.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_password_confirmation"))]
pub struct ChangeIdentityRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: Option<String>,

    #[serde(alias = "password2")]
    pub password_confirmation: Option<String>,
}

fn validate_password_confirmation(req: &ChangeIdentityRequest) -> Result<(), ValidationError> {
    if req.password != req.password_confirmation {
        let mut error = ValidationError::new("must_match");
        error.message = Some("passwords do not match".into());
        return Err(error);
    }
    Ok(())
}

/// Caller metadata captured for the auth history on login.
#[derive(Debug, Clone, Default)]
pub struct LoginContext {
    pub user_agent: String,
    pub ip_address: Option<String>,
    /// Explicit device class; derived from the user agent when absent.
    pub device: Option<DeviceClass>,
}

impl LoginContext {
    pub fn new(user_agent: impl Into<String>, ip_address: Option<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ip_address,
            device: None,
        }
    }

    pub fn with_device(mut self, device: DeviceClass) -> Self {
        self.device = Some(device);
        self
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device
            .unwrap_or_else(|| DeviceClass::from_user_agent(&self.user_agent))
    }
}

/// Token pair returned by register, login and identity change.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Access token minted by the refresh flow.
#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AccessTokenResponse {
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
