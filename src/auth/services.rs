use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, warn};

use crate::auth::{
    claims::Claims,
    errors::{AuthError, StoreError},
    jwt::JwtKeys,
    password::{hash_password, verify_dummy, verify_password},
    repo::UserStore,
    repo_types::{NewUser, User},
};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Registration and login over a [`UserStore`].
///
/// Holds the signing secret and token lifetime; both are fixed at construction
/// and the service is shared read-only across requests.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            store,
            keys: JwtKeys::new(secret, ttl),
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Hash the password and persist a new user.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        // Hash first: a hashing failure must not reach the store.
        let password_hash = hash_password(password)?;

        let new_user = NewUser {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash,
        };

        match self.store.create_user(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "user registered");
                Ok(user)
            }
            Err(StoreError::DuplicateEmail) => {
                warn!(email = %email, "email already registered");
                Err(AuthError::EmailExists)
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                Err(AuthError::RegistrationFailed(e))
            }
        }
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown email, store failure, and wrong password all produce
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = match self.store.get_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                warn!(email = %email, "login unknown email");
                verify_dummy(password);
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "get_user_by_email failed");
                verify_dummy(password);
                return Err(AuthError::InvalidCredentials);
            }
        };

        debug!(user_id = %user.id, "verifying password");
        match verify_password(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = %user.id, "login invalid password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(_) => {
                error!(user_id = %user.id, "stored password hash is unreadable");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let token = self.keys.sign(user.id, &user.username).map_err(|e| {
            error!(user_id = %user.id, error = %e, "jwt sign failed");
            AuthError::TokenIssuanceFailed
        })?;

        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome { token, user })
    }

    /// Validate a bearer token against this service's secret.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.keys.verify(token)
    }
}
