use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::store::models::communication::{Announcement, SchoolEvent};
use crate::AppState;

const PUBLISHERS: &[Role] = &[Role::Admin, Role::Moderator, Role::Registrar];

#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub audience: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    pub school_year: String,
}

/// POST /communication/announcements
pub async fn create_announcement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> ApiResult<Announcement> {
    auth.require_any(PUBLISHERS)?;

    if payload.title.is_empty() || payload.content.is_empty() {
        return Err(ApiError::validation("Title and content are required"));
    }

    let announcement =
        Announcement::new(payload.title, payload.content, payload.audience, auth.id);
    state.store.add_announcement(announcement.clone()).await;
    state.store.checkpoint().await;

    Ok(ApiResponse::created(announcement))
}

/// GET /communication/announcements - newest first, any authenticated caller.
pub async fn announcements(State(state): State<AppState>) -> ApiResult<Vec<Announcement>> {
    Ok(ApiResponse::success(state.store.announcements().await))
}

/// POST /communication/events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<SchoolEvent> {
    auth.require_any(PUBLISHERS)?;

    if payload.title.is_empty() || payload.school_year.is_empty() {
        return Err(ApiError::validation("Title and school year are required"));
    }

    let event = SchoolEvent {
        id: Uuid::new_v4(),
        title: payload.title,
        description: payload.description,
        date: payload.date,
        location: payload.location,
        school_year: payload.school_year,
        created_by: auth.id,
        created_at: Utc::now(),
    };
    state.store.add_event(event.clone()).await;
    state.store.checkpoint().await;

    Ok(ApiResponse::created(event))
}

/// GET /communication/events - any authenticated caller.
pub async fn events(State(state): State<AppState>) -> ApiResult<Vec<SchoolEvent>> {
    Ok(ApiResponse::success(state.store.events().await))
}
