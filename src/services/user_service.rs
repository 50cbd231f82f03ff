use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::auth::{self, Claims, TokenError};
use crate::config;
use crate::store::models::user::{PublicUser, User};
use crate::store::Store;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is locked")]
    AccountLocked,
    #[error("Invalid role")]
    UnknownRole,
    #[error("Invalid role: Registrar can only assign Moderator, Admin, or SSG")]
    RoleNotAssignable,
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// An issued session: the token plus what the client needs to display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
    pub expires_in: i64,
}

pub struct UserService {
    store: Arc<Store>,
}

impl UserService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Self-service registration; every account starts as `User` and earns
    /// `Student` through enrollment approval.
    pub async fn register(&self, email: &str, password: &str) -> Result<PublicUser, UserError> {
        if email.is_empty() || password.is_empty() {
            return Err(UserError::MissingCredentials);
        }
        if self.store.user_by_email(email).await.is_some() {
            return Err(UserError::EmailTaken);
        }

        let user = User::new(
            email.to_string(),
            auth::obfuscate_credential(password),
            Role::User,
        );
        let view = PublicUser::from(&user);
        self.store.insert_user(user).await;
        self.store.checkpoint().await;

        tracing::info!(email, "user registered");
        Ok(view)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, UserError> {
        if email.is_empty() || password.is_empty() {
            return Err(UserError::MissingCredentials);
        }

        let user = self
            .store
            .user_by_email(email)
            .await
            .ok_or(UserError::InvalidCredentials)?;

        if auth::obfuscate_credential(password) != user.password {
            return Err(UserError::InvalidCredentials);
        }
        if user.locked {
            return Err(UserError::AccountLocked);
        }

        let claims = Claims::for_login(&user);
        let token = auth::issue_token(&claims)?;

        Ok(Session {
            token,
            user: PublicUser::from(&user),
            expires_in: claims.expires_in(),
        })
    }

    /// Mint a short-lived token for another user's identity. The resulting
    /// claims carry the impersonating actor's id.
    pub async fn impersonate(&self, actor: Uuid, user_id: Uuid) -> Result<Session, UserError> {
        let user = self.store.user(user_id).await.ok_or(UserError::NotFound)?;

        let claims = Claims::for_impersonation(&user, actor);
        let token = auth::issue_token(&claims)?;

        tracing::info!(%actor, user = %user_id, "impersonation token issued");
        Ok(Session {
            token,
            user: PublicUser::from(&user),
            expires_in: claims.expires_in(),
        })
    }

    pub async fn list_users(&self) -> Vec<PublicUser> {
        self.store
            .users_all()
            .await
            .iter()
            .map(PublicUser::from)
            .collect()
    }

    /// SuperAdmin role change; any canonical role is assignable.
    pub async fn update_role(&self, user_id: Uuid, role: &str) -> Result<PublicUser, UserError> {
        let role = Role::normalize(role);
        if matches!(role, Role::Other(_)) {
            return Err(UserError::UnknownRole);
        }

        let user = self
            .store
            .update_user(user_id, |u| u.role = role)
            .await
            .ok_or(UserError::NotFound)?;
        self.store.checkpoint().await;

        Ok(PublicUser::from(&user))
    }

    /// Registrar role grant. Grant-only, limited to Moderator / Admin / SSG;
    /// profile fields may be filled in at the same time.
    pub async fn assign_role(
        &self,
        user_id: Uuid,
        role: &str,
        full_name: Option<String>,
        lrn: Option<String>,
    ) -> Result<PublicUser, UserError> {
        let role = Role::normalize(role);
        if !matches!(role, Role::Moderator | Role::Admin | Role::Ssg) {
            return Err(UserError::RoleNotAssignable);
        }

        let user = self
            .store
            .update_user(user_id, |u| {
                u.role = role;
                if let Some(name) = full_name {
                    u.full_name = name;
                }
                if let Some(lrn) = lrn {
                    u.lrn = Some(lrn);
                }
            })
            .await
            .ok_or(UserError::NotFound)?;
        self.store.checkpoint().await;

        Ok(PublicUser::from(&user))
    }

    /// Admin: make a user the Moderator (teacher), optionally setting them
    /// as adviser of a section.
    pub async fn assign_moderator(
        &self,
        user_id: Uuid,
        section_id: Option<Uuid>,
    ) -> Result<PublicUser, UserError> {
        let user = self
            .store
            .update_user(user_id, |u| u.role = Role::Moderator)
            .await
            .ok_or(UserError::NotFound)?;

        if let Some(section_id) = section_id {
            self.store
                .update_section(section_id, |s| s.adviser = Some(user_id))
                .await;
        }
        self.store.checkpoint().await;

        Ok(PublicUser::from(&user))
    }

    pub async fn set_locked(&self, user_id: Uuid, locked: bool) -> Result<PublicUser, UserError> {
        let user = self
            .store
            .update_user(user_id, |u| u.locked = locked)
            .await
            .ok_or(UserError::NotFound)?;
        self.store.checkpoint().await;

        Ok(PublicUser::from(&user))
    }

    /// Ensure a SuperAdmin account exists; runs at startup.
    pub async fn seed_super_admin(&self) {
        if !self
            .store
            .users_with_role(&Role::SuperAdmin)
            .await
            .is_empty()
        {
            return;
        }

        let security = &config::config().security;
        let user = User::new(
            security.seed_superadmin_email.clone(),
            auth::obfuscate_credential(&security.seed_superadmin_password),
            Role::SuperAdmin,
        );
        tracing::info!(email = %user.email, "seeded SuperAdmin account");
        self.store.insert_user(user).await;
        self.store.checkpoint().await;
    }
}
