use service_core::error::AppError;
use thiserror::Error;

/// Errors a store implementation may report.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Record not found")]
    NotFound,

    #[error("Store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("User already exists")]
    DuplicateUser,

    #[error("Role already exists")]
    DuplicateRole,

    #[error("User not found")]
    UserNotFound,

    #[error("Role not found")]
    RoleNotFound,

    #[error("Role is not assigned to user")]
    AssignmentNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Wrong refresh token")]
    StaleRefreshToken,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Role {0} is protected")]
    ProtectedRole(String),

    #[error("Incorrect data")]
    Persistence,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Translate a store failure, keeping raw storage detail out of the
    /// caller-facing error.
    pub(crate) fn from_store(err: StoreError, on_conflict: ServiceError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) => {
                tracing::debug!(constraint = %constraint, "Store rejected write");
                on_conflict
            }
            StoreError::NotFound => on_conflict,
            StoreError::Backend(e) => ServiceError::Internal(e),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => ServiceError::Persistence,
            StoreError::NotFound => ServiceError::Persistence,
            StoreError::Backend(e) => ServiceError::Internal(e),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => AppError::ValidationError(e),
            ServiceError::DuplicateUser => {
                AppError::UnprocessableEntity(anyhow::anyhow!("User already exists"))
            }
            ServiceError::DuplicateRole => {
                AppError::BadRequest(anyhow::anyhow!("Role already exists"))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User does not exist")),
            ServiceError::RoleNotFound => AppError::NotFound(anyhow::anyhow!("Role not found")),
            ServiceError::AssignmentNotFound => {
                AppError::NotFound(anyhow::anyhow!("Role is not assigned to user"))
            }
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::StaleRefreshToken => {
                AppError::Unauthorized(anyhow::anyhow!("Wrong refresh token"))
            }
            ServiceError::RevokedToken => {
                AppError::Unauthorized(anyhow::anyhow!("Token has been revoked"))
            }
            ServiceError::ExpiredToken => {
                AppError::Unauthorized(anyhow::anyhow!("Token has expired"))
            }
            ServiceError::InvalidToken => AppError::Unauthorized(anyhow::anyhow!("Invalid token")),
            ServiceError::Forbidden(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            ServiceError::ProtectedRole(name) => {
                AppError::Forbidden(anyhow::anyhow!("Role {} is protected", name))
            }
            ServiceError::Persistence => {
                AppError::UnprocessableEntity(anyhow::anyhow!("Incorrect data"))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::http::StatusCode;

    #[test]
    fn maps_taxonomy_to_http_statuses() {
        let cases = [
            (ServiceError::DuplicateUser, StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Persistence, StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::DuplicateRole, StatusCode::BAD_REQUEST),
            (ServiceError::UserNotFound, StatusCode::NOT_FOUND),
            (ServiceError::RoleNotFound, StatusCode::NOT_FOUND),
            (ServiceError::AssignmentNotFound, StatusCode::NOT_FOUND),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::StaleRefreshToken, StatusCode::UNAUTHORIZED),
            (ServiceError::RevokedToken, StatusCode::UNAUTHORIZED),
            (ServiceError::ExpiredToken, StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("admin only".to_string()), StatusCode::FORBIDDEN),
            (ServiceError::ProtectedRole("guest".to_string()), StatusCode::FORBIDDEN),
        ];

        for (err, status) in cases {
            let label = err.to_string();
            assert_eq!(AppError::from(err).status_code(), status, "{label}");
        }
    }

    #[test]
    fn store_conflicts_do_not_leak_constraint_names() {
        let err = ServiceError::from(StoreError::UniqueViolation("users_email_key".to_string()));
        assert!(matches!(err, ServiceError::Persistence));
        assert!(!AppError::from(err).to_string().contains("users_email_key"));
    }
}
