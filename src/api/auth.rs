use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::errors::AppError;

/// Authenticated caller identity for the prediction endpoints.
///
/// Session issuance and verification live in the platform's auth service;
/// by the time a request reaches this core the bearer token carries the
/// caller's user id as its subject. Requests without a parseable bearer
/// subject are rejected with no side effects.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
        let user_id = Uuid::parse_str(token.trim()).map_err(|_| AppError::Unauthorized)?;

        Ok(AuthUser(user_id))
    }
}

/// Shared-secret guard for scheduler-triggered validator endpoints.
///
/// If `CRON_SECRET` is set, every trigger must carry
/// `Authorization: Bearer <secret>` matching that value.
/// If unset, the triggers are open (dev mode).
pub async fn require_cron_auth(req: Request, next: Next) -> Response {
    let expected = std::env::var("CRON_SECRET").unwrap_or_default();

    if expected.is_empty() {
        return next.run(req).await;
    }

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.strip_prefix("Bearer ") == Some(expected.as_str()) => {
            next.run(req).await
        }
        _ => (StatusCode::UNAUTHORIZED, "Missing or invalid Authorization header").into_response(),
    }
}
