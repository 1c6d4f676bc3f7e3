use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::TokenKind, jwt::JwtKeys};
use crate::error::{AppError, AppResult};

/// Caller identity for the request: `None` when no Authorization header was
/// sent. A header that is present but not a valid access token is rejected.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
            return Ok(Caller(None));
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
            .ok_or(AppError::Unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token, TokenKind::Access).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            AppError::Unauthorized
        })?;

        Ok(Caller(Some(claims.sub)))
    }
}

/// Session holder or `Unauthorized`.
pub fn require_caller(caller: Option<Uuid>) -> AppResult<Uuid> {
    caller.ok_or(AppError::Unauthorized)
}

/// `Forbidden` unless the caller owns the resource.
pub fn require_owner(caller: Option<Uuid>, owner_id: Uuid) -> AppResult<Uuid> {
    let caller = require_caller(caller)?;
    if caller != owner_id {
        return Err(AppError::Forbidden);
    }
    Ok(caller)
}
