use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MeResponse, PublicUser, RegisterRequest},
        errors::AuthError,
        extractors::AuthUser,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/validate", get(validate))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Unparseable, mistyped, or incomplete bodies are all 400s.
fn bad_body(rejection: JsonRejection) -> AuthError {
    warn!(error = %rejection.body_text(), "invalid request body");
    AuthError::Validation("invalid request body".into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AuthError> {
    let Json(payload) = payload.map_err(bad_body)?;
    let payload = payload.validated()?;
    let user = state
        .auth
        .register(&payload.username, &payload.email, &payload.password)
        .await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(payload) = payload.map_err(bad_body)?;
    let payload = payload.validated()?;
    let outcome = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse {
        token: outcome.token,
        user: outcome.user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn validate(AuthUser(_claims): AuthUser) -> &'static str {
    "valid token"
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: claims.sub,
        username: claims.username,
    })
}
