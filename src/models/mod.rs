// src/models/mod.rs

pub mod badge;
pub mod comment;
pub mod dashboard;
pub mod post;
pub mod purchase;
pub mod user;
