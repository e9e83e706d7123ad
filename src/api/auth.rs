use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use crate::api::AppState;
use crate::auth::{Claims, Role};
use crate::db::User;
use crate::errors::VulnscanError;

/// A request carrying a valid bearer token whose user still exists.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub claims: Claims,
}

impl CurrentUser {
    /// Both the token and the stored account must carry ADMIN, so a demoted admin's old token stops working.
    pub fn is_admin(&self) -> bool {
        self.claims.role == Role::Admin && self.user.role == Role::Admin
    }
}

/// A [`CurrentUser`] holding the ADMIN role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

fn bearer_token(headers: &HeaderMap) -> Result<&str, VulnscanError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| VulnscanError::Authentication("Missing Authorization header".into()))?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| VulnscanError::Authentication("Expected 'Bearer <token>' authorization".into()))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = VulnscanError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.tokens.verify(token)?;
        let user = state
            .db
            .get_user(claims.sub)?
            .ok_or_else(|| VulnscanError::Permission("User not found!".into()))?;
        Ok(CurrentUser { user, claims })
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = VulnscanError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if !current.is_admin() {
            return Err(VulnscanError::Permission("Admin access required".into()));
        }
        Ok(AdminUser(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(bearer_token(&headers), Err(VulnscanError::Authentication(_))));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }
}
