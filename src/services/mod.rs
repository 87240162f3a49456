// src/services/mod.rs

pub mod comments;
pub mod posts;
pub mod ratings;
pub mod uploads;

pub use comments::CommentService;
pub use posts::PostService;
pub use ratings::RatingService;
pub use uploads::UploadService;
