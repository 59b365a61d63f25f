use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{JwtConfig, MAX_ACCESS_TOKEN_HOURS, MAX_REFRESH_TOKEN_DAYS};
use crate::services::ServiceError;

/// Token type tag carried in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims shared by access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user email)
    pub sub: String,
    /// JWT ID (revocation key)
    pub jti: String,
    /// Token type
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// A freshly minted token and its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_hours: i64,
    refresh_token_expires_days: i64,
}

impl JwtService {
    /// Create a new JWT service signing with the process-wide HS256 secret
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if config.secret_key.is_empty() {
            anyhow::bail!("JWT signing secret must not be empty");
        }
        if !(1..=MAX_ACCESS_TOKEN_HOURS).contains(&config.access_token_expires_hours)
            || !(1..=MAX_REFRESH_TOKEN_DAYS).contains(&config.refresh_token_expires_days)
        {
            anyhow::bail!("JWT token lifetimes are out of range");
        }

        tracing::info!("JWT service initialized with HS256 secret");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            access_token_expires_hours: config.access_token_expires_hours,
            refresh_token_expires_days: config.refresh_token_expires_days,
        })
    }

    /// Issue a short-lived access token for a subject
    pub fn issue_access_token(&self, subject: &str) -> Result<IssuedToken, ServiceError> {
        self.issue(subject, TokenType::Access)
    }

    /// Issue a long-lived refresh token for a subject
    pub fn issue_refresh_token(&self, subject: &str) -> Result<IssuedToken, ServiceError> {
        self.issue(subject, TokenType::Refresh)
    }

    /// Issue both access and refresh tokens
    pub fn issue_token_pair(
        &self,
        subject: &str,
    ) -> Result<(IssuedToken, IssuedToken), ServiceError> {
        Ok((
            self.issue_access_token(subject)?,
            self.issue_refresh_token(subject)?,
        ))
    }

    fn issue(&self, subject: &str, token_type: TokenType) -> Result<IssuedToken, ServiceError> {
        let now = Utc::now();
        let exp = now + self.lifetime(token_type);

        let claims = TokenClaims {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            token_type,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode {} token: {}", token_type, e))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature and expiry and return the claims.
    ///
    /// Revocation is not checked here; that needs the ledger.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ServiceError::ExpiredToken,
                _ => {
                    tracing::debug!(error = %e, "Rejected malformed or forged token");
                    ServiceError::InvalidToken
                }
            })
    }

    /// Configured lifetime for a token type.
    pub fn lifetime(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => Duration::hours(self.access_token_expires_hours),
            TokenType::Refresh => Duration::days(self.refresh_token_expires_days),
        }
    }

    /// Get access token expiry in seconds (for client info)
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.lifetime(TokenType::Access).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret_key: secret.to_string(),
            access_token_expires_hours: 1,
            refresh_token_expires_days: 1,
        }
    }

    #[test]
    fn test_jwt_service_rejects_empty_secret() {
        assert!(JwtService::new(&test_config("")).is_err());
    }

    #[test]
    fn test_jwt_service_rejects_out_of_range_lifetimes() {
        let mut config = test_config("test-secret");
        config.refresh_token_expires_days = i64::MAX;
        assert!(JwtService::new(&config).is_err());

        let mut config = test_config("test-secret");
        config.access_token_expires_hours = 0;
        assert!(JwtService::new(&config).is_err());
    }

    #[test]
    fn test_access_token_generation_and_validation() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config("test-secret"))?;

        let issued = service.issue_access_token("alice@example.com")?;
        assert!(!issued.token.is_empty());

        let claims = service.decode(&issued.token)?;
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 3600);

        Ok(())
    }

    #[test]
    fn test_refresh_token_generation_and_validation() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config("test-secret"))?;

        let issued = service.issue_refresh_token("alice@example.com")?;
        let claims = service.decode(&issued.token)?;
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.exp - claims.iat, 86_400);

        Ok(())
    }

    #[test]
    fn test_token_pair_has_distinct_ids() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config("test-secret"))?;

        let (access, refresh) = service.issue_token_pair("alice@example.com")?;
        assert_ne!(access.claims.jti, refresh.claims.jti);
        assert_ne!(access.token, refresh.token);

        Ok(())
    }

    #[test]
    fn test_payload_uses_wire_claim_names() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config("test-secret"))?;
        let issued = service.issue_refresh_token("alice@example.com")?;

        let payload = serde_json::to_value(&issued.claims)?;
        assert_eq!(payload["type"], "refresh");
        assert_eq!(payload["sub"], "alice@example.com");
        assert!(payload["jti"].is_string());
        assert!(payload["exp"].is_i64());

        Ok(())
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() -> Result<(), anyhow::Error> {
        let ours = JwtService::new(&test_config("test-secret"))?;
        let theirs = JwtService::new(&test_config("another-secret"))?;

        let forged = theirs.issue_access_token("alice@example.com")?;
        assert!(matches!(ours.decode(&forged.token), Err(ServiceError::InvalidToken)));

        Ok(())
    }

    #[test]
    fn test_rejects_garbage() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config("test-secret"))?;
        assert!(matches!(service.decode("not.a.jwt"), Err(ServiceError::InvalidToken)));
        assert!(matches!(service.decode(""), Err(ServiceError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn test_expired_token_reports_expiry() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config("test-secret"))?;
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: "alice@example.com".to_string(),
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
            exp: now - 10,
            iat: now - 3610,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )?;

        assert!(matches!(service.decode(&token), Err(ServiceError::ExpiredToken)));
        Ok(())
    }
}
