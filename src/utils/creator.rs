use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the shared creator secret.
pub const CREATOR_KEY_HEADER: &str = "x-creator-key";

/// The creator secret presented by the caller, if any.
///
/// Extraction never fails; the owning service decides whether the key is valid
/// so that authorization is checked before the body is validated.
#[derive(Debug, Clone, Default)]
pub struct CreatorKey(pub Option<String>);

impl CreatorKey {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for CreatorKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(CREATOR_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(CreatorKey(key))
    }
}

/// Fails with `Unauthorized` unless `provided` equals the configured secret.
pub fn authorize_creator(provided: Option<&str>, expected: &str) -> Result<(), AppError> {
    match provided {
        Some(key) if key == expected => Ok(()),
        _ => Err(AppError::Unauthorized("Creator only".to_string())),
    }
}
