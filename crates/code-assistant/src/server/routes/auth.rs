//! Registration, login and current-user endpoints

use axum::{extract::State, Form, Json};

use crate::auth::{AuthUser, LoginForm, RegisterRequest, TokenResponse};
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::User;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<User>> {
    Ok(Json(state.auth().register(request).await?))
}

/// POST /api/auth/login - Form-encoded `username` and `password`
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Json<TokenResponse>> {
    Ok(Json(state.auth().login(form).await?))
}

/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
