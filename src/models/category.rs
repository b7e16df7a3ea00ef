//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tool and article category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    /// Display name (unique)
    pub name: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Font Awesome icon class
    pub icon: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category annotated with the number of tools filed under it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub category: Category,
    pub tool_count: i64,
}

/// Writable category fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryInput {
    pub name: String,
    /// Derived from `name` when blank
    pub slug: String,
    pub icon: String,
    pub description: String,
}

impl From<&Category> for CategoryInput {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            icon: category.icon.clone(),
            description: category.description.clone(),
        }
    }
}
