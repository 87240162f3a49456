// src/utils/mod.rs

pub mod creator;
pub mod json;
pub mod time;
