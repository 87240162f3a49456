use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::upload::UploadResponse,
    services::{UploadService, uploads::IncomingFile},
    utils::creator::CreatorKey,
};

/// Multipart field holding the image.
const FILE_FIELD: &str = "file";

/// Upload an image for a future post.
/// Requires: `x-creator-key` header. Returns `{ "url": ... }`.
pub async fn upload_image(
    State(uploads): State<UploadService>,
    creator: CreatorKey,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    uploads.authorize(creator.as_deref())?;
    let mut multipart = multipart?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        file = Some(IncomingFile {
            file_name,
            content_type,
            bytes,
        });
        break;
    }

    let url = uploads.upload_image(creator.as_deref(), file).await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
