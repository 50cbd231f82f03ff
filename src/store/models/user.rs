use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::roles::Role;

/// Identity record. Never hard-deleted; accounts are locked instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Obfuscated credential. Excluded from all public views.
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    /// 12-digit learner reference number, unique when present.
    #[serde(default)]
    pub lrn: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub extra_roles: Vec<Role>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password,
            full_name: String::new(),
            lrn: None,
            role,
            extra_roles: Vec::new(),
            locked: false,
            profile_pic: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display name falling back to the email, as shown on enrollment
    /// applications.
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.email
        } else {
            &self.full_name
        }
    }
}

/// Client-facing view of a user; hides the stored credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub lrn: Option<String>,
    pub role: Role,
    pub extra_roles: Vec<Role>,
    pub locked: bool,
    pub profile_pic: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            lrn: user.lrn.clone(),
            role: user.role.clone(),
            extra_roles: user.extra_roles.clone(),
            locked: user.locked,
            profile_pic: user.profile_pic.clone(),
        }
    }
}
