use serde::Serialize;

/// Response body of a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}
