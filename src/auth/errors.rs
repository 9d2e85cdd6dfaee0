use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors surfaced by the auth core to its callers.
///
/// Messages are safe to show to clients: store and hasher details are logged
/// where they happen and never carried in the variant.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already exists")]
    EmailExists,

    /// Unknown email and wrong password are deliberately the same variant.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Carries the store failure for logging; only the generic message reaches clients.
    #[error("registration failed")]
    RegistrationFailed(#[source] StoreError),

    #[error("token issuance failed")]
    TokenIssuanceFailed,

    #[error("password hashing failed")]
    Hashing,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("invalid token claims")]
    InvalidClaims,

    #[error("{0}")]
    Validation(String),
}

impl AuthError {
    /// True for every token validation failure, expired or forged.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::Malformed
                | AuthError::InvalidClaims
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::EmailExists => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            e if e.is_token_error() => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Errors reported by a [`UserStore`](super::repo::UserStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
