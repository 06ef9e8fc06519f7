use axum::{extract::State, http::StatusCode};

use crate::error::KomikError;
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::router::KomikState;
use crate::service::Principal;
use crate::service::auth::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RecoverRequest, RegisterRequest,
};

/// GET /auth/me
pub async fn me(AuthUser(principal): AuthUser) -> Json<Principal> {
    Json(principal)
}

/// POST /auth/login
pub async fn login(
    State(state): State<KomikState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, KomikError> {
    Ok(Json(state.auth.login(req).await?))
}

/// POST /auth/register
pub async fn register(
    State(state): State<KomikState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), KomikError> {
    let resp = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /auth/change-password -> rotates the security stamp and returns a fresh token.
pub async fn change_password(
    State(state): State<KomikState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<AuthResponse>, KomikError> {
    Ok(Json(state.auth.change_password(&principal, req).await?))
}

/// POST /auth/recover -> resets the owner password with the one-time recovery key.
pub async fn recover(
    State(state): State<KomikState>,
    Json(req): Json<RecoverRequest>,
) -> Result<Json<AuthResponse>, KomikError> {
    Ok(Json(state.auth.recover(req).await?))
}
