//! Caller identity as asserted by the fronting identity provider.
//!
//! The provider authenticates the user and forwards three headers. A
//! request without `X-User-Id` is anonymous; operations that need a user
//! reject it with [`ServiceError::Unauthenticated`].

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use confcentral::errors::ServiceError;
use confcentral::id::ProfileId;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NICKNAME_HEADER: &str = "x-user-nickname";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: ProfileId,
    pub email: String,
    pub nickname: String,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            user_id: ProfileId::from_string(user_id.into()),
            email: email.into(),
            nickname: nickname.into(),
        }
    }

    /// Reads the identity headers; `None` when no user id was forwarded.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = header(headers, USER_ID_HEADER)?;
        let email = header(headers, USER_EMAIL_HEADER).unwrap_or_default();
        let nickname = header(headers, USER_NICKNAME_HEADER).unwrap_or_else(|| {
            email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .unwrap_or(&user_id)
                .to_string()
        });

        Some(Self::new(user_id, email, nickname))
    }
}

/// The possibly anonymous caller of a request.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }

    pub fn require(&self) -> Result<&Identity, ServiceError> {
        self.identity().ok_or(ServiceError::Unauthenticated)
    }
}

impl From<Identity> for Caller {
    fn from(identity: Identity) -> Self {
        Self(Some(identity))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Identity::from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn anonymous_without_user_id() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("ferris@example.com"));
        assert_eq!(Identity::from_headers(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(Identity::from_headers(&headers), None);
    }

    #[test]
    fn nickname_falls_back_to_email_then_user_id() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u-42"));
        let identity = Identity::from_headers(&headers).unwrap();
        assert_eq!(identity.nickname, "u-42");
        assert_eq!(identity.email, "");

        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("ferris@example.com"));
        let identity = Identity::from_headers(&headers).unwrap();
        assert_eq!(identity.nickname, "ferris");

        headers.insert(USER_NICKNAME_HEADER, HeaderValue::from_static("Ferris"));
        let identity = Identity::from_headers(&headers).unwrap();
        assert_eq!(identity.nickname, "Ferris");
        assert_eq!(identity.user_id.as_str(), "u-42");
    }

    #[test]
    fn require_rejects_anonymous_callers() {
        assert!(matches!(
            Caller::default().require(),
            Err(ServiceError::Unauthenticated)
        ));
        let caller = Caller::from(Identity::new("u1", "a@b.c", "a"));
        assert_eq!(caller.require().unwrap().nickname, "a");
    }
}
