use std::sync::Arc;
use validator::Validate;

use crate::config::HashingConfig;
use crate::dtos::auth::{
    AccessTokenResponse, ChangeIdentityRequest, LoginContext, LoginRequest, RegisterRequest,
    TokenResponse,
};
use crate::models::User;
use crate::services::audit::AuditRecorder;
use crate::services::identity::IdentityProvider;
use crate::services::jwt::{IssuedToken, JwtService, TokenClaims, TokenType};
use crate::services::redis::RevocationLedger;
use crate::services::store::UserStore;
use crate::services::ServiceError;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Login, logout, refresh and credential change flows.
///
/// A user holds exactly one live refresh token: the one stored on their row.
/// Every flow that mints a pair overwrites it, so older refresh tokens stop
/// working for `refresh`. Writes touch only the columns a flow changes;
/// concurrent logins race on the refresh token alone and the last one wins.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
    ledger: Arc<dyn RevocationLedger>,
    jwt: JwtService,
    hashing: HashingConfig,
    audit: AuditRecorder,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        identity: Arc<dyn IdentityProvider>,
        ledger: Arc<dyn RevocationLedger>,
        jwt: JwtService,
        hashing: HashingConfig,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            users,
            identity,
            ledger,
            jwt,
            hashing,
            audit,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<TokenResponse, ServiceError> {
        req.validate()?;

        let password_hash = self.hash(Password::new(req.password)).await?;
        let (access, refresh) = self.jwt.issue_token_pair(&req.email)?;

        let user = User::new(
            req.email,
            password_hash.into_string(),
            refresh.token.clone(),
        );
        self.users
            .create(&user)
            .await
            .map_err(|e| ServiceError::from_store(e, ServiceError::DuplicateUser))?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(self.token_response(access, refresh))
    }

    pub async fn login(
        &self,
        req: LoginRequest,
        context: &LoginContext,
    ) -> Result<TokenResponse, ServiceError> {
        req.validate()?;

        let user = self
            .users
            .find_by_email(&req.email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let stored = PasswordHashString::new(user.password_hash.clone());
        if !self.verify(Password::new(req.password), stored).await? {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        if !user.active {
            return Err(ServiceError::Forbidden("Account is deactivated".to_string()));
        }

        let (access, refresh) = self.jwt.issue_token_pair(&user.email)?;
        self.users.set_refresh_token(user.id, &refresh.token).await?;

        // The login stands even when the history write fails.
        if let Err(e) = self
            .audit
            .record(
                &user,
                &context.user_agent,
                context.ip_address.as_deref(),
                context.device_class(),
            )
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to record auth history");
        }

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(self.token_response(access, refresh))
    }

    /// Revoke the presented token, access or refresh, for the rest of its
    /// type's lifetime.
    pub async fn logout(&self, token: &str) -> Result<TokenType, ServiceError> {
        let claims = self.verify_token(token, None).await?;
        let ttl = self.jwt.lifetime(claims.token_type).num_seconds();

        self.ledger
            .revoke(&claims.jti, ttl)
            .await
            .map_err(|e| ServiceError::Internal(e.context("Failed to revoke token")))?;

        tracing::info!(
            jti = %claims.jti,
            token_type = claims.token_type.as_str(),
            "Token revoked"
        );

        Ok(claims.token_type)
    }

    /// Apply the provided email and password changes and rotate the session.
    pub async fn change_identity(
        &self,
        current: &User,
        req: ChangeIdentityRequest,
    ) -> Result<TokenResponse, ServiceError> {
        req.validate()?;

        let password_hash = match req.password {
            Some(password) => Some(self.hash(Password::new(password)).await?.into_string()),
            None => None,
        };
        let subject = req.email.as_deref().unwrap_or(&current.email);
        let (access, refresh) = self.jwt.issue_token_pair(subject)?;

        self.users
            .update_identity(
                current.id,
                req.email.as_deref(),
                password_hash.as_deref(),
                &refresh.token,
            )
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %current.id, error = %e, "Identity change rejected by store");
                ServiceError::from_store(e, ServiceError::Persistence)
            })?;

        tracing::info!(user_id = %current.id, "User identity changed");

        Ok(self.token_response(access, refresh))
    }

    /// Mint a new access token from the user's current refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessTokenResponse, ServiceError> {
        let claims = self
            .verify_token(refresh_token, Some(TokenType::Refresh))
            .await?;
        let user = self.identity.resolve(&claims).await?;

        if user.refresh_token != refresh_token {
            tracing::warn!(user_id = %user.id, "Refresh with superseded token");
            return Err(ServiceError::StaleRefreshToken);
        }

        let access = self.jwt.issue_access_token(&user.email)?;
        Ok(AccessTokenResponse::new(
            access.token,
            self.jwt.access_token_expiry_seconds(),
        ))
    }

    /// Verify an access token presented on a protected call.
    pub async fn authenticate(&self, token: &str) -> Result<TokenClaims, ServiceError> {
        self.verify_token(token, Some(TokenType::Access)).await
    }

    /// Authenticate and resolve the caller. Deactivated users are refused.
    pub async fn current_user(&self, token: &str) -> Result<User, ServiceError> {
        let claims = self.authenticate(token).await?;
        let user = self.identity.resolve(&claims).await?;

        if !user.active {
            return Err(ServiceError::Forbidden("Account is deactivated".to_string()));
        }
        Ok(user)
    }

    /// Create an administrator account.
    pub async fn create_superuser(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: password.to_string(),
        }
        .validate()?;

        let password_hash = self.hash(Password::new(password.to_string())).await?;
        let refresh = self.jwt.issue_refresh_token(email)?;

        let user = User::new_admin(email.to_string(), password_hash.into_string(), refresh.token);
        self.users
            .create(&user)
            .await
            .map_err(|e| ServiceError::from_store(e, ServiceError::DuplicateUser))?;

        tracing::info!(user_id = %user.id, "Superuser created");
        Ok(user)
    }

    async fn verify_token(
        &self,
        token: &str,
        expected: Option<TokenType>,
    ) -> Result<TokenClaims, ServiceError> {
        let claims = self.jwt.decode(token)?;

        if let Some(expected) = expected {
            if claims.token_type != expected {
                tracing::debug!(
                    expected = expected.as_str(),
                    actual = claims.token_type.as_str(),
                    "Token type mismatch"
                );
                return Err(ServiceError::InvalidToken);
            }
        }

        let revoked = self.ledger.is_revoked(&claims.jti).await.map_err(|e| {
            tracing::error!(jti = %claims.jti, error = %e, "Revocation ledger unavailable");
            ServiceError::Internal(e.context("Revocation ledger unavailable"))
        })?;
        if revoked {
            return Err(ServiceError::RevokedToken);
        }

        Ok(claims)
    }

    async fn hash(&self, password: Password) -> Result<PasswordHashString, ServiceError> {
        let hashing = self.hashing.clone();
        tokio::task::spawn_blocking(move || hash_password(&password, &hashing))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))
    }

    async fn verify(
        &self,
        password: Password,
        stored: PasswordHashString,
    ) -> Result<bool, ServiceError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("Password verification task failed: {}", e))
            })
    }

    fn token_response(&self, access: IssuedToken, refresh: IssuedToken) -> TokenResponse {
        TokenResponse::new(
            access.token,
            refresh.token,
            self.jwt.access_token_expiry_seconds(),
        )
    }
}
