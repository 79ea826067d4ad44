// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Display name.
    pub nome: String,

    /// Unique username.
    pub username: String,

    /// Unique login email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub bio: Option<String>,
    pub avatar: Option<String>,

    /// Guardian address used for the consent link; never exposed.
    #[serde(skip)]
    pub parental_email: Option<String>,

    /// Whether the account has been confirmed through the consent link.
    pub is_verified: bool,

    /// Gamification score used by the ranking.
    pub points: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Columns selected whenever a full `User` row is loaded.
pub const USER_COLUMNS: &str = "id, nome, username, email, password, bio, avatar, \
     parental_email, is_verified, points, created_at";

/// Public summary of a user, embedded in feeds, search results and follow lists.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub nome: String,
    pub avatar: Option<String>,
}

/// Row of the gamification ranking.
#[derive(Debug, Serialize, FromRow)]
pub struct RankingEntry {
    pub username: String,
    pub points: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required."))]
    pub nome: String,
    #[validate(length(
        min = 3,
        max = 80,
        message = "Username length must be between 3 and 80 characters."
    ))]
    pub username: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(email(message = "Invalid parental email address."))]
    pub parental_email: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub senha: String,
}

/// Query string of the parental consent link.
#[derive(Debug, Deserialize)]
pub struct ConsentParams {
    pub user_id: i64,
}

/// DTO for updating profile fields. Absent fields keep their value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub nome: Option<String>,
    #[validate(length(max = 250))]
    pub bio: Option<String>,
    #[validate(length(max = 250), custom(function = validate_url_string))]
    pub avatar: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
pub fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
