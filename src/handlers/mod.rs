// src/handlers/mod.rs

pub mod comments;
pub mod health;
pub mod posts;
pub mod ratings;
pub mod uploads;
