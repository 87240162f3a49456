use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::post::CreatePostRequest,
    services::PostService,
    utils::{creator::CreatorKey, json::ApiJson},
};

/// Create a new post.
/// Requires: `x-creator-key` header.
pub async fn create_post(
    State(posts): State<PostService>,
    creator: CreatorKey,
    payload: Result<ApiJson<CreatePostRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    // A bad key wins over a bad body.
    let request = match payload {
        Ok(ApiJson(request)) => request,
        Err(rejection) => {
            posts.authorize(creator.as_deref())?;
            return Err(rejection);
        }
    };

    let post = posts.create_post(creator.as_deref(), request).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// List posts (recent first).
pub async fn list_posts(State(posts): State<PostService>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.list_posts().await?))
}

/// Get a single post by ID.
pub async fn get_post(
    State(posts): State<PostService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.get_post(&id).await?))
}
