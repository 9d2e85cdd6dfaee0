use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{errors::AuthError, repo_types::User};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Identity carried by a validated token.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl RegisterRequest {
    /// Normalize the email and enforce field rules before the core sees them.
    pub fn validated(mut self) -> Result<Self, AuthError> {
        self.email = normalize_email(&self.email);
        self.username = self.username.trim().to_owned();

        let name_len = self.username.chars().count();
        if !(3..=32).contains(&name_len) {
            return Err(AuthError::Validation(
                "username must be 3-32 characters".into(),
            ));
        }
        if !is_valid_email(&self.email) {
            return Err(AuthError::Validation("invalid email".into()));
        }
        if self.password.chars().count() < 8 {
            return Err(AuthError::Validation("password too short".into()));
        }
        Ok(self)
    }
}

impl LoginRequest {
    pub fn validated(mut self) -> Result<Self, AuthError> {
        self.email = normalize_email(&self.email);
        if !is_valid_email(&self.email) {
            return Err(AuthError::Validation("invalid email".into()));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation("password required".into()));
        }
        Ok(self)
    }
}
