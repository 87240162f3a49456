use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError, models::rating::SubmitRatingRequest, services::RatingService,
    utils::json::ApiJson,
};

/// Submit a 1-5 rating for a post. Returns the updated aggregate.
pub async fn submit_rating(
    State(ratings): State<RatingService>,
    Path(post_id): Path<String>,
    ApiJson(payload): ApiJson<SubmitRatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let value = payload
        .rating_value()
        .ok_or_else(|| AppError::InvalidArgument("rating must be a number 1-5".to_string()))?;

    let aggregate = ratings.submit_rating(&post_id, value).await?;

    Ok(Json(aggregate))
}
