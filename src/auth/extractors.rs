use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tracing::warn;

use super::claims::Claims;
use crate::state::AppState;

/// Extracts and validates the bearer token, yielding its claims.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "authorization header required".into(),
            ))?;

        // The core accepts the value with or without the "Bearer " prefix
        let claims = state.auth.validate(auth).map_err(|e| {
            warn!(error = %e, "invalid token");
            (StatusCode::UNAUTHORIZED, "invalid token".into())
        })?;

        Ok(AuthUser(claims))
    }
}
