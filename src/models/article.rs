//! Article model
//!
//! - `Article` entity, the stored row
//! - `ArticleDetail`, the row plus its category and related tool ids
//! - `ArticleInput`, the writable fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blog article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    pub title: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    pub content: String,
    /// Teaser shown in listings
    pub excerpt: String,
    /// Author user ID
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
    /// Stored path of the header image
    pub featured_image: Option<String>,
    /// Whether the article is publicly listed
    pub is_published: bool,
    /// View count; only ever incremented
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Article with its relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    /// Category ids
    pub categories: Vec<i64>,
    /// Tool ids
    pub related_tools: Vec<i64>,
}

/// Writable article fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleInput {
    pub title: String,
    /// Derived from `title` when blank
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
    pub featured_image: Option<String>,
    pub categories: Vec<i64>,
    pub related_tools: Vec<i64>,
    pub is_published: bool,
}

impl From<&ArticleDetail> for ArticleInput {
    fn from(detail: &ArticleDetail) -> Self {
        let article = &detail.article;
        Self {
            title: article.title.clone(),
            slug: article.slug.clone(),
            content: article.content.clone(),
            excerpt: article.excerpt.clone(),
            author_id: article.author_id,
            featured_image: article.featured_image.clone(),
            categories: detail.categories.clone(),
            related_tools: detail.related_tools.clone(),
            is_published: article.is_published,
        }
    }
}
