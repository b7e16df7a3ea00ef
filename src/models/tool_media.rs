//! Rows owned by a tool: screenshots, videos and feature bullet points
//!
//! All three are deleted together with their tool.

use serde::{Deserialize, Serialize};

/// Screenshot or gallery image of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ToolImage {
    pub id: i64,
    #[serde(rename = "tool")]
    pub tool_id: i64,
    /// Stored path relative to the media root
    pub image: String,
    pub caption: String,
    pub is_featured: bool,
}

/// Writable tool image fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolImageInput {
    #[serde(rename = "tool")]
    pub tool_id: Option<i64>,
    pub image: String,
    pub caption: String,
    pub is_featured: bool,
}

impl From<&ToolImage> for ToolImageInput {
    fn from(image: &ToolImage) -> Self {
        Self {
            tool_id: Some(image.tool_id),
            image: image.image.clone(),
            caption: image.caption.clone(),
            is_featured: image.is_featured,
        }
    }
}

/// Embedded or linked demo video of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ToolVideo {
    pub id: i64,
    #[serde(rename = "tool")]
    pub tool_id: i64,
    pub video_url: String,
    pub caption: String,
    pub is_featured: bool,
}

/// Writable tool video fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolVideoInput {
    #[serde(rename = "tool")]
    pub tool_id: Option<i64>,
    pub video_url: String,
    pub caption: String,
    pub is_featured: bool,
}

impl From<&ToolVideo> for ToolVideoInput {
    fn from(video: &ToolVideo) -> Self {
        Self {
            tool_id: Some(video.tool_id),
            video_url: video.video_url.clone(),
            caption: video.caption.clone(),
            is_featured: video.is_featured,
        }
    }
}

/// Feature bullet shown on a tool's page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feature {
    pub id: i64,
    #[serde(rename = "tool")]
    pub tool_id: i64,
    pub name: String,
    pub description: String,
    /// Font Awesome icon class
    pub icon: String,
}

/// Writable feature fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureInput {
    #[serde(rename = "tool")]
    pub tool_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl From<&Feature> for FeatureInput {
    fn from(feature: &Feature) -> Self {
        Self {
            tool_id: Some(feature.tool_id),
            name: feature.name.clone(),
            description: feature.description.clone(),
            icon: feature.icon.clone(),
        }
    }
}
