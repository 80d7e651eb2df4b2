//! Account API endpoints.
//!
//! Provides HTTP endpoints for:
//! - Registration (POST /auth/create)
//! - Login (POST /auth/login)
//! - Access token refresh (POST /auth/refresh)
//! - Current user profile (GET /auth/profile)

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::auth::{AuthUser, RegisterRequest};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/create", post(create_user))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/profile", get(profile))
}

async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body?;
    let (user, tokens) = state.accounts.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "User created successfully",
            "refresh": tokens.refresh,
            "access": tokens.access,
            "data": user,
        })),
    )
        .into_response())
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body?;
    let (user, tokens) = state
        .accounts
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Login successful",
        "refresh": tokens.refresh,
        "access": tokens.access,
        "user": user,
    })))
}

async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body?;
    let access = state.accounts.refresh(&request.refresh).await?;

    Ok(Json(json!({
        "status": true,
        "access": access,
    })))
}

async fn profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let profile = state.accounts.profile(user.id).await?;

    Ok(Json(json!({
        "status": true,
        "message": "User profile",
        "data": profile,
    })))
}
