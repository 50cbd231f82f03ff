pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod sheets;
pub mod store;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use sheets::{CsvSheetStore, SheetStore};
use store::Store;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub sheets: Arc<dyn SheetStore>,
}

impl AppState {
    pub fn new(store: Arc<Store>, sheets: Arc<dyn SheetStore>) -> Self {
        Self { store, sheets }
    }

    /// Fresh in-memory state with the CSV sheet fallback. Used by tests and
    /// development runs without a data directory.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(Store::in_memory()),
            sheets: Arc::new(CsvSheetStore::new(&config::config().sheets.exports_dir)),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API behind the bearer-token middleware
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::{auth, ssg};

    Router::new()
        // Token acquisition and release
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Election results and SSG listings are open reads
        .route("/ssg/elections", get(ssg::elections))
        .route("/ssg/election/:id/tally", get(ssg::tally))
        .route("/ssg/events", get(ssg::events))
        .route("/ssg/members", get(ssg::members))
}

fn protected_routes() -> Router<AppState> {
    use handlers::{academics, admin, auth, communication, enrollment, registrar, ssg, super_admin};

    Router::new()
        // Session introspection
        .route("/auth/me", get(auth::me))
        // Applicant-facing enrollment
        .route("/enrollment", post(enrollment::submit))
        .route("/enrollment/me", get(enrollment::my_enrollment))
        // Registrar: enrollment lifecycle
        .route("/registrar/enrollment/pending", get(registrar::pending))
        .route("/registrar/enrollment/approved", get(registrar::approved))
        .route("/registrar/enrollment/archived", get(registrar::archived))
        .route("/registrar/enrollment/:id/approve", post(registrar::approve))
        .route("/registrar/enrollment/:id/reject", post(registrar::reject))
        .route("/registrar/enrollment/:id/archive", post(registrar::archive))
        .route("/registrar/enrollment/:id/restore", post(registrar::restore))
        // Registrar: sections, stats, role grants
        .route(
            "/registrar/sections",
            get(registrar::sections).post(registrar::create_section),
        )
        .route("/registrar/stats", get(registrar::stats))
        .route("/registrar/assign-role", post(registrar::assign_role))
        // Student government
        .route("/ssg/election", post(ssg::create_election))
        .route("/ssg/nominate", post(ssg::nominate))
        .route("/ssg/vote", post(ssg::vote))
        .route("/ssg/event", post(ssg::create_event))
        // SuperAdmin
        .route("/super/users", get(super_admin::users))
        .route("/super/update-role", post(super_admin::update_role))
        .route("/super/lock-user", post(super_admin::lock_user))
        .route("/super/unlock-user", post(super_admin::unlock_user))
        .route("/super/impersonate", post(super_admin::impersonate))
        // Admin
        .route("/admin/assign-moderator", post(admin::assign_moderator))
        // Academics
        .route("/academics/recordbook", post(academics::create_record_book))
        .route("/academics/grades/me", get(academics::my_grades))
        .route("/academics/attendance", post(academics::mark_attendance))
        // Announcements and events
        .route(
            "/communication/announcements",
            get(communication::announcements).post(communication::create_announcement),
        )
        .route(
            "/communication/events",
            get(communication::events).post(communication::create_event),
        )
        .route_layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Campus API",
            "version": version,
            "description": "School administration backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/register, /auth/login, /auth/logout (public), /auth/me (protected)",
                "enrollment": "/enrollment, /enrollment/me (protected)",
                "registrar": "/registrar/* (protected, Registrar)",
                "ssg": "/ssg/* (elections/events/members public; mutations protected)",
                "super": "/super/* (protected, SuperAdmin)",
                "academics": "/academics/* (protected)",
                "communication": "/communication/* (protected)",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
