pub mod roles;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config;
use crate::store::models::user::User;
use roles::Role;

/// Identity claims carried by every bearer token.
///
/// `imp` is set only on impersonation tokens and holds the id of the
/// SuperAdmin who minted the token, so audit trails can tell the two apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub extra_roles: Vec<Role>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lrn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imp: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for a normal login session.
    pub fn for_login(user: &User) -> Self {
        Self::build(user, config::config().security.token_ttl_hours, None)
    }

    /// Claims for a SuperAdmin impersonation session. Shorter-lived, and
    /// tagged with the impersonating actor.
    pub fn for_impersonation(user: &User, actor: Uuid) -> Self {
        Self::build(
            user,
            config::config().security.impersonation_ttl_hours,
            Some(actor),
        )
    }

    fn build(user: &User, ttl_hours: u64, imp: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            extra_roles: user.extra_roles.clone(),
            full_name: user.full_name.clone(),
            lrn: user.lrn.clone(),
            imp,
            iat: now.timestamp(),
            exp: (now + Duration::hours(ttl_hours as i64)).timestamp(),
        }
    }

    /// Seconds until this token expires, clamped at zero.
    pub fn expires_in(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("JWT generation error: {0}")]
    Generation(String),
    #[error("Invalid or expired token")]
    Invalid,
}

pub fn issue_token(claims: &Claims) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

pub fn validate_token(token: &str) -> Result<Claims, TokenError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|_| TokenError::Invalid)?;

    Ok(token_data.claims)
}

/// Obfuscate a stored credential.
///
/// Not a security boundary: the scheme only needs to be opaque and stable so
/// stored credentials never appear in plain text. Login compares the
/// obfuscated forms directly.
pub fn obfuscate_credential(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generated password for accounts created during enrollment approval.
pub fn generated_password() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..8].to_string()
}
