use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::Session;
use crate::services::UserService;
use crate::store::models::user::PublicUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub user_id: Uuid,
    pub role: String,
}

/// GET /super/users - all accounts, credentials hidden.
pub async fn users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<PublicUser>> {
    auth.require_any(&[Role::SuperAdmin])?;

    Ok(ApiResponse::success(
        UserService::new(state.store.clone()).list_users().await,
    ))
}

/// POST /super/update-role - set any canonical role on an account.
pub async fn update_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<PublicUser> {
    auth.require_any(&[Role::SuperAdmin])?;

    let user = UserService::new(state.store.clone())
        .update_role(payload.user_id, &payload.role)
        .await?;

    Ok(ApiResponse::success(user))
}

/// POST /super/lock-user - prevent further logins.
pub async fn lock_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UserIdRequest>,
) -> ApiResult<PublicUser> {
    auth.require_any(&[Role::SuperAdmin])?;

    let user = UserService::new(state.store.clone())
        .set_locked(payload.user_id, true)
        .await?;

    Ok(ApiResponse::success(user))
}

/// POST /super/unlock-user
pub async fn unlock_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UserIdRequest>,
) -> ApiResult<PublicUser> {
    auth.require_any(&[Role::SuperAdmin])?;

    let user = UserService::new(state.store.clone())
        .set_locked(payload.user_id, false)
        .await?;

    Ok(ApiResponse::success(user))
}

/// POST /super/impersonate - mint a short-lived token for another identity.
pub async fn impersonate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UserIdRequest>,
) -> ApiResult<Session> {
    auth.require_any(&[Role::SuperAdmin])?;

    let session = UserService::new(state.store.clone())
        .impersonate(auth.id, payload.user_id)
        .await?;

    Ok(ApiResponse::success(session))
}
