use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::Session;
use crate::services::UserService;
use crate::store::models::user::PublicUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    fn email(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }

    fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}

/// POST /auth/register - create an account with the base `User` role.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> ApiResult<PublicUser> {
    let user = UserService::new(state.store.clone())
        .register(payload.email(), payload.password())
        .await?;

    Ok(ApiResponse::created(user))
}

/// POST /auth/login - authenticate and receive a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> ApiResult<Session> {
    let session = UserService::new(state.store.clone())
        .login(payload.email(), payload.password())
        .await?;

    Ok(ApiResponse::success(session))
}

/// POST /auth/logout - tokens are stateless, so logout is client-side.
pub async fn logout() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "message": "Logged out; discard the token client-side"
    })))
}

/// GET /auth/me - echo the caller's token claims.
pub async fn me(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": auth.id,
        "email": auth.email,
        "role": auth.role,
        "extraRoles": auth.extra_roles,
        "fullName": auth.full_name,
        "lrn": auth.lrn,
        "impersonatedBy": auth.impersonated_by,
    })))
}
