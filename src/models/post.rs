use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::utils::time::iso_millis;

/// A published photo. Stored in the `posts` container, partitioned by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub location: String,
    /// Free text naming who is in the photo.
    #[serde(default)]
    pub people: String,
    /// Public URL of the uploaded image.
    pub image_url: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new post.
/// Every field defaults so that a missing field is a validation error, not a parse error.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,

    pub caption: Option<String>,
    pub location: Option<String>,
    pub people: Option<String>,

    #[validate(
        length(min = 1, message = "imageUrl is required"),
        custom(function = validate_url_string)
    )]
    pub image_url: String,
}

/// Validates that a string is an absolute http(s) URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_url")
            .with_message("imageUrl must be an http(s) URL".into())),
    }
}
