use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{models::User, AppState};

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

/// Middleware to require a live access token.
///
/// Resolves the caller through the session manager's identity lookup and
/// stores the `User` in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok_or_else(|| {
        AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
    })?;

    let user = state.sessions.current_user(&token).await.map_err(|e| {
        tracing::debug!(error = %e, "Rejected request token");
        AppError::from(e)
    })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Middleware to require an administrator. Must run inside `auth_middleware`.
pub async fn admin_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req.extensions().get::<User>().cloned().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("Authenticated user missing from request"))
    })?;

    state.authz.require_admin(&user).await?;

    Ok(next.run(req).await)
}

/// Extractor to easily get the authenticated user in handlers
pub struct AuthUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Authenticated user missing from request extensions"
            ))
        })?;

        Ok(AuthUser(user.clone()))
    }
}
