use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError, models::comment::CreateCommentRequest, services::CommentService,
    utils::json::ApiJson,
};

/// Create a new comment on a post.
pub async fn create_comment(
    State(comments): State<CommentService>,
    Path(post_id): Path<String>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comments.create_comment(&post_id, payload).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// List all comments for a post (recent first).
pub async fn list_comments(
    State(comments): State<CommentService>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(comments.list_comments(&post_id).await?))
}
