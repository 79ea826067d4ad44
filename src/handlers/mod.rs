// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod community;
pub mod dashboard;
pub mod gamification;
pub mod interaction;
pub mod products;
pub mod profile;
pub mod search;
pub mod social;
