// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    config::{BlobStoreConfig, Config},
    handlers::{comments, health, posts, ratings, uploads},
    state::AppState,
    utils::creator::CREATOR_KEY_HEADER,
};

/// Assembles the main application router.
///
/// * Mounts the post, comment, rating and upload routes under `/api`.
/// * Serves locally stored uploads and, if configured, the browser client.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let post_routes = Router::new()
        .route("/", get(posts::list_posts).post(posts::create_post))
        .route("/{id}", get(posts::get_post))
        .route(
            "/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/{id}/rating", post(ratings::submit_rating));

    let upload_routes = Router::new()
        .route("/", post(uploads::upload_image))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    let mut app = Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/posts", post_routes)
        .nest("/api/uploads", upload_routes);

    if let BlobStoreConfig::Local { dir, .. } = &config.blob_store {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app = match &config.static_dir {
        Some(dir) => app.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => app.route("/", get(health::health)),
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config)),
    )
    .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(CREATOR_KEY_HEADER),
        ]);

    if config.cors_allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}
