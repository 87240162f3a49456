use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    blob::BlobStore,
    config::Config,
    services::{CommentService, PostService, RatingService, UploadService},
    store::{DocumentClient, DocumentStore},
};

/// Shared handler state. Store handles are created once in `main` (or by a
/// test) and injected here; services only hold cheap clones of them.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub comments: CommentService,
    pub ratings: RatingService,
    pub uploads: UploadService,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        let client = DocumentClient::new(documents);

        Self {
            posts: PostService::new(&client, &config.creator_key),
            comments: CommentService::new(&client),
            ratings: RatingService::new(&client, config.rating_consistency),
            uploads: UploadService::new(blobs, &config.creator_key),
            config,
        }
    }
}

impl FromRef<AppState> for PostService {
    fn from_ref(state: &AppState) -> Self {
        state.posts.clone()
    }
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        state.comments.clone()
    }
}

impl FromRef<AppState> for RatingService {
    fn from_ref(state: &AppState) -> Self {
        state.ratings.clone()
    }
}

impl FromRef<AppState> for UploadService {
    fn from_ref(state: &AppState) -> Self {
        state.uploads.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
