use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::time::iso_millis;

pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// A comment on a post. Stored in the `comments` container, partitioned by `postId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub text: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new comment.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateCommentRequest {
    /// Display name. Older clients send it as `name`.
    #[serde(alias = "name")]
    pub author: Option<String>,

    #[validate(custom(function = not_blank, message = "text is required"))]
    pub text: String,
}

impl CreateCommentRequest {
    /// Trimmed author, or `"Anonymous"` when absent or blank.
    pub fn author_or_default(&self) -> String {
        match self.author.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => author.to_string(),
            _ => ANONYMOUS_AUTHOR.to_string(),
        }
    }
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}
