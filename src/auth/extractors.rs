use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::warn;

use super::jwt::{JwtKeys, TOKEN_COOKIE};
use crate::{error::AppError, state::AppState, users::repo as users_repo};

/// Authenticated caller, identified by email.
pub struct AuthUser(pub String);

/// Authenticated caller holding the `admin` role.
pub struct AdminUser(pub String);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

fn cookie_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| AppError::Unauthenticated("unauthorized access".into()))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims.sub)),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                Err(AppError::Unauthenticated("invalid or expired token".into()))
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(email) = AuthUser::from_request_parts(parts, state).await?;
        let user = users_repo::find_by_email(state.store.as_ref(), &email).await?;
        if !user.map(|u| u.is_admin()).unwrap_or(false) {
            warn!(email = %email, "admin route refused");
            return Err(AppError::forbidden());
        }
        Ok(AdminUser(email))
    }
}

/// Rejects callers acting on another user's email.
pub fn ensure_self(caller: &str, email: &str) -> Result<(), AppError> {
    if caller != email {
        warn!(caller = %caller, email = %email, "identity mismatch");
        return Err(AppError::forbidden());
    }
    Ok(())
}
