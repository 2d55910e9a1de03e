//! Request-level auth and caller-address helpers.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use services::services::auth::{AuthError, AuthIdentity, AuthService};

use crate::{error::ApiError, state::AppState};

/// Extractor for routes that require a verified caller identity.
pub struct AuthSession(pub AuthIdentity);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        identity_from_headers(&parts.headers, &state.auth)
            .map(AuthSession)
            .ok_or(ApiError::Auth(AuthError::Unauthorized))
    }
}

/// Verify the bearer token in the Authorization header, if any.
pub fn identity_from_headers(headers: &HeaderMap, auth: &AuthService) -> Option<AuthIdentity> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    auth.verify_bearer(token).ok()
}

/// Caller address for policy decisions: first entry of x-forwarded-for,
/// falling back to loopback.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}
