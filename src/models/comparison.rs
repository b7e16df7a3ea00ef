//! Comparison model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AiToolDetail;

/// Editorial side-by-side comparison of several tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comparison {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comparison with the compared tools embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDetail {
    #[serde(flatten)]
    pub comparison: Comparison,
    pub tools: Vec<AiToolDetail>,
}

/// Writable comparison fields.
///
/// `tools` is read-only in the representation, so the compared tools are
/// written through `tool_ids`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonInput {
    pub title: String,
    /// Derived from `title` when blank
    pub slug: String,
    pub content: String,
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
    pub is_published: bool,
    pub tool_ids: Vec<i64>,
}

impl From<&ComparisonDetail> for ComparisonInput {
    fn from(detail: &ComparisonDetail) -> Self {
        let comparison = &detail.comparison;
        Self {
            title: comparison.title.clone(),
            slug: comparison.slug.clone(),
            content: comparison.content.clone(),
            author_id: comparison.author_id,
            is_published: comparison.is_published,
            tool_ids: detail.tools.iter().map(|t| t.tool.id).collect(),
        }
    }
}
