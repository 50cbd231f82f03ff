use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;
use crate::store::models::user::PublicUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignModeratorRequest {
    pub user_id: Uuid,
    /// Section to set the new moderator as adviser of.
    #[serde(default)]
    pub section_id: Option<Uuid>,
}

/// POST /admin/assign-moderator - make a user the Moderator (teacher),
/// optionally advising a section.
pub async fn assign_moderator(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<AssignModeratorRequest>,
) -> ApiResult<PublicUser> {
    auth.require_any(&[Role::Admin])?;

    let user = UserService::new(state.store.clone())
        .assign_moderator(payload.user_id, payload.section_id)
        .await?;

    Ok(ApiResponse::success(user))
}
