use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{Comment, CreateCommentRequest},
    store::{Container, ContainerName, DocumentClient, QuerySpec},
    utils::time,
};

#[derive(Clone)]
pub struct CommentService {
    comments: Container,
}

impl CommentService {
    pub fn new(client: &DocumentClient) -> Self {
        Self {
            comments: client.container(ContainerName::Comments),
        }
    }

    /// Create a new comment on `post_id`.
    /// The post itself is not looked up.
    pub async fn create_comment(
        &self,
        post_id: &str,
        request: CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        request.validate()?;

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            author: request.author_or_default(),
            text: request.text.trim().to_string(),
            created_at: time::now(),
        };

        let stored = self
            .comments
            .create(&comment)
            .await
            .map_err(|e| AppError::upstream("Failed to create comment", e))?;

        Ok(stored.value)
    }

    /// List all comments for a post, newest first.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let spec = QuerySpec::new()
            .filter_eq("postId", post_id)
            .order_by_desc("createdAt");

        let comments = self
            .comments
            .query::<Comment>(&spec)
            .await
            .map_err(|e| AppError::upstream("Failed to fetch comments", e))?;

        Ok(comments.into_iter().map(|stored| stored.value).collect())
    }
}
