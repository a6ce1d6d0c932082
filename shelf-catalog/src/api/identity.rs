//! Caller identity extraction
//!
//! Authentication happens upstream of this service. The gateway forwards the
//! verified user id and roles as request headers; handlers that need an
//! identity take a [`Caller`] argument and get 401 when it is missing.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::access::{Caller, Role};
use crate::error::ApiError;

/// Verified user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Comma-separated role names (`user`, `admin`); unknown names are ignored
pub const USER_ROLES_HEADER: &str = "x-user-roles";

/// Read the caller from request headers, `None` when no user id is present
pub fn caller_from_headers(headers: &HeaderMap) -> Option<Caller> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())?;

    // Every identified caller is at least a plain user
    let mut roles = vec![Role::User];
    let granted = headers
        .get(USER_ROLES_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    for role in granted.split(',').filter_map(Role::parse) {
        if !roles.contains(&role) {
            roles.push(role);
        }
    }

    Some(Caller::new(user_id, roles))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).ok_or_else(|| {
            tracing::warn!(path = %parts.uri.path(), "Request without caller identity");
            ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER))
        })
    }
}
