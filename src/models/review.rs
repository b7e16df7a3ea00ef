//! Review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest accepted rating
pub const MIN_RATING: i32 = 1;
/// Highest accepted rating
pub const MAX_RATING: i32 = 5;

/// A user's rating and write-up of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    #[serde(rename = "tool")]
    pub tool_id: i64,
    /// Reviewer; `None` for anonymous or deleted users
    #[serde(rename = "user")]
    pub user_id: Option<i64>,
    pub rating: i32,
    pub title: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable review fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewInput {
    #[serde(rename = "tool")]
    pub tool_id: Option<i64>,
    #[serde(rename = "user")]
    pub user_id: Option<i64>,
    pub rating: Option<i64>,
    pub title: String,
    pub content: String,
    pub is_approved: bool,
}

impl From<&Review> for ReviewInput {
    fn from(review: &Review) -> Self {
        Self {
            tool_id: Some(review.tool_id),
            user_id: review.user_id,
            rating: Some(review.rating as i64),
            title: review.title.clone(),
            content: review.content.clone(),
            is_approved: review.is_approved,
        }
    }
}
