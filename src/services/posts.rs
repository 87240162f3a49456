use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::post::{CreatePostRequest, Post},
    store::{Container, ContainerName, DocumentClient, QuerySpec},
    utils::{creator::authorize_creator, time},
};

#[derive(Clone)]
pub struct PostService {
    posts: Container,
    creator_key: Arc<str>,
}

impl PostService {
    pub fn new(client: &DocumentClient, creator_key: &str) -> Self {
        Self {
            posts: client.container(ContainerName::Posts),
            creator_key: Arc::from(creator_key),
        }
    }

    /// Checks the creator key without touching the store.
    pub fn authorize(&self, creator_key: Option<&str>) -> Result<(), AppError> {
        authorize_creator(creator_key, &self.creator_key)
    }

    /// Create a new post.
    /// Requires the creator key; checked before the payload is looked at.
    pub async fn create_post(
        &self,
        creator_key: Option<&str>,
        request: CreatePostRequest,
    ) -> Result<Post, AppError> {
        self.authorize(creator_key)?;
        request.validate()?;

        let post = Post {
            id: Uuid::new_v4().to_string(),
            title: request.title,
            caption: request.caption.unwrap_or_default(),
            location: request.location.unwrap_or_default(),
            people: request.people.unwrap_or_default(),
            image_url: request.image_url,
            created_at: time::now(),
        };

        let stored = self
            .posts
            .create(&post)
            .await
            .map_err(|e| AppError::upstream("Failed to create post", e))?;

        tracing::info!(post_id = %stored.value.id, "Post created");
        Ok(stored.value)
    }

    /// List posts (recent first).
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let spec = QuerySpec::new().order_by_desc("createdAt");

        let posts = self
            .posts
            .query::<Post>(&spec)
            .await
            .map_err(|e| AppError::upstream("Failed to fetch posts", e))?;

        Ok(posts.into_iter().map(|stored| stored.value).collect())
    }

    /// Get a single post by ID.
    pub async fn get_post(&self, id: &str) -> Result<Post, AppError> {
        let spec = QuerySpec::new().filter_eq("id", id);

        self.posts
            .query::<Post>(&spec)
            .await
            .map_err(|e| AppError::upstream("Failed to fetch post", e))?
            .into_iter()
            .next()
            .map(|stored| stored.value)
            .ok_or(AppError::NotFound("Post not found".to_string()))
    }
}
