use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use campus_api::auth::roles::Role;
use campus_api::auth::{self, Claims};
use campus_api::sheets::CsvSheetStore;
use campus_api::store::models::user::User;
use campus_api::store::Store;
use campus_api::{app, AppState};

pub const PASSWORD: &str = "password123";

/// In-process application plus direct store access for seeding.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<Store>,
}

pub fn spawn_app() -> TestApp {
    // Redirect the sheet fallback at a per-run temp directory.
    let sheets_dir = std::env::temp_dir().join(format!("campus-test-{}", Uuid::new_v4()));
    let mut state = AppState::in_memory();
    state.sheets = Arc::new(CsvSheetStore::new(sheets_dir));
    let store = state.store.clone();

    TestApp {
        app: app(state),
        store,
    }
}

impl TestApp {
    /// Seed a user directly and mint a login token for it.
    pub async fn seed_user(&self, email: &str, role: Role, lrn: Option<&str>) -> (Uuid, String) {
        let mut user = User::new(
            email.to_string(),
            auth::obfuscate_credential(PASSWORD),
            role,
        );
        user.lrn = lrn.map(str::to_string);
        user.full_name = format!("Seeded {email}");
        let id = user.id;

        let token = auth::issue_token(&Claims::for_login(&user)).expect("token");
        self.store.insert_user(user).await;

        (id, token)
    }

    /// Fire one request at the router and decode the JSON body.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        (status, value)
    }
}
