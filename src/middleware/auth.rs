use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::roles::{authorize, Role};
use crate::auth::{validate_token, Claims};
use crate::error::ApiError;

/// Authenticated caller context extracted from the bearer token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub extra_roles: Vec<Role>,
    pub full_name: String,
    pub lrn: Option<String>,
    /// Id of the SuperAdmin this session is impersonating on behalf of.
    pub impersonated_by: Option<Uuid>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
            extra_roles: claims.extra_roles,
            full_name: claims.full_name,
            lrn: claims.lrn,
            impersonated_by: claims.imp,
        }
    }
}

impl AuthUser {
    /// Role gate applied as the first statement of every role-restricted
    /// handler. An empty requirement admits any authenticated caller;
    /// SuperAdmin passes unconditionally.
    pub fn require_any(&self, required: &[Role]) -> Result<(), ApiError> {
        if authorize(required, &self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Forbidden: Insufficient role"))
        }
    }
}

/// JWT authentication middleware that validates tokens and attaches the
/// caller context to the request.
///
/// A request with no credential gets 401; a presented-but-rejected
/// credential gets 403. Role checks happen later, in the handlers.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let claims = validate_token(&token)?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| ApiError::unauthorized("Unauthorized: Missing token"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Unauthorized: Invalid token format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::unauthorized("Unauthorized: Invalid token format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert("authorization", HeaderValue::from_str(v).unwrap());
        }
        headers
    }

    #[test]
    fn missing_header_is_401() {
        let err = extract_bearer_token(&headers_with(None)).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn non_bearer_and_empty_tokens_are_rejected() {
        for bad in ["Basic abc", "Bearer ", "Bearer    "] {
            let err = extract_bearer_token(&headers_with(Some(bad))).unwrap_err();
            assert_eq!(err.status_code(), 401, "for header {bad:?}");
        }
    }

    #[test]
    fn bearer_token_is_extracted() {
        let token = extract_bearer_token(&headers_with(Some("Bearer abc.def.ghi"))).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn guard_denies_insufficient_role_with_403() {
        let auth = AuthUser {
            id: Uuid::new_v4(),
            email: "s@campus.local".to_string(),
            role: Role::Student,
            extra_roles: vec![],
            full_name: String::new(),
            lrn: None,
            impersonated_by: None,
        };
        assert!(auth.require_any(&[]).is_ok());
        assert!(auth.require_any(&[Role::Student]).is_ok());
        let err = auth.require_any(&[Role::Registrar]).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
