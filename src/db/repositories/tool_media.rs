//! Repositories for the rows a tool owns: images, videos and features

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::common;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{
    Feature, FeatureInput, ToolImage, ToolImageInput, ToolVideo, ToolVideoInput,
};

const IMAGE_COLUMNS: &str = "id, tool_id, image, caption, is_featured";
const VIDEO_COLUMNS: &str = "id, tool_id, video_url, caption, is_featured";
const FEATURE_COLUMNS: &str = "id, tool_id, name, description, icon";

#[async_trait]
pub trait ToolImageRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<ToolImage>, i64)>;
    async fn list_for_tools(&self, tool_ids: &[i64]) -> Result<Vec<ToolImage>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<ToolImage>>;
    async fn create(&self, input: &ToolImageInput) -> Result<ToolImage>;
    async fn update(&self, id: i64, input: &ToolImageInput) -> Result<Option<ToolImage>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait ToolVideoRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<ToolVideo>, i64)>;
    async fn list_for_tools(&self, tool_ids: &[i64]) -> Result<Vec<ToolVideo>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<ToolVideo>>;
    async fn create(&self, input: &ToolVideoInput) -> Result<ToolVideo>;
    async fn update(&self, id: i64, input: &ToolVideoInput) -> Result<Option<ToolVideo>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait FeatureRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<Feature>, i64)>;
    async fn list_for_tools(&self, tool_ids: &[i64]) -> Result<Vec<Feature>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Feature>>;
    async fn create(&self, input: &FeatureInput) -> Result<Feature>;
    async fn update(&self, id: i64, input: &FeatureInput) -> Result<Option<Feature>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxToolImageRepository {
    pool: DynDatabasePool,
}

impl SqlxToolImageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ToolImageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ToolImageRepository for SqlxToolImageRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<ToolImage>, i64)> {
        common::fetch_page(&self.pool, query, IMAGE_COLUMNS).await
    }

    async fn list_for_tools(&self, tool_ids: &[i64]) -> Result<Vec<ToolImage>> {
        common::fetch_where_in(&self.pool, "tool_images", IMAGE_COLUMNS, "tool_id", tool_ids, "id")
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ToolImage>> {
        common::fetch_by_id(&self.pool, "tool_images", IMAGE_COLUMNS, id).await
    }

    async fn create(&self, input: &ToolImageInput) -> Result<ToolImage> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO tool_images (tool_id, image, caption, is_featured) VALUES (?, ?, ?, ?)",
            )
            .bind(input.tool_id)
            .bind(&input.image)
            .bind(&input.caption)
            .bind(input.is_featured)
            .execute(conn)
            .await
            .context("Failed to create tool image")?
            .inserted_id()
        });
        self.get_by_id(id)
            .await?
            .context("Tool image missing after insert")
    }

    async fn update(&self, id: i64, input: &ToolImageInput) -> Result<Option<ToolImage>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE tool_images SET tool_id = ?, image = ?, caption = ?, is_featured = ? WHERE id = ?",
            )
            .bind(input.tool_id)
            .bind(&input.image)
            .bind(&input.caption)
            .bind(input.is_featured)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update tool image")?
            .rows_affected()
        });
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, "tool_images", id).await
    }
}

pub struct SqlxToolVideoRepository {
    pool: DynDatabasePool,
}

impl SqlxToolVideoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ToolVideoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ToolVideoRepository for SqlxToolVideoRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<ToolVideo>, i64)> {
        common::fetch_page(&self.pool, query, VIDEO_COLUMNS).await
    }

    async fn list_for_tools(&self, tool_ids: &[i64]) -> Result<Vec<ToolVideo>> {
        common::fetch_where_in(&self.pool, "tool_videos", VIDEO_COLUMNS, "tool_id", tool_ids, "id")
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ToolVideo>> {
        common::fetch_by_id(&self.pool, "tool_videos", VIDEO_COLUMNS, id).await
    }

    async fn create(&self, input: &ToolVideoInput) -> Result<ToolVideo> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO tool_videos (tool_id, video_url, caption, is_featured) VALUES (?, ?, ?, ?)",
            )
            .bind(input.tool_id)
            .bind(&input.video_url)
            .bind(&input.caption)
            .bind(input.is_featured)
            .execute(conn)
            .await
            .context("Failed to create tool video")?
            .inserted_id()
        });
        self.get_by_id(id)
            .await?
            .context("Tool video missing after insert")
    }

    async fn update(&self, id: i64, input: &ToolVideoInput) -> Result<Option<ToolVideo>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE tool_videos SET tool_id = ?, video_url = ?, caption = ?, is_featured = ? WHERE id = ?",
            )
            .bind(input.tool_id)
            .bind(&input.video_url)
            .bind(&input.caption)
            .bind(input.is_featured)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update tool video")?
            .rows_affected()
        });
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, "tool_videos", id).await
    }
}

pub struct SqlxFeatureRepository {
    pool: DynDatabasePool,
}

impl SqlxFeatureRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FeatureRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FeatureRepository for SqlxFeatureRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<Feature>, i64)> {
        common::fetch_page(&self.pool, query, FEATURE_COLUMNS).await
    }

    async fn list_for_tools(&self, tool_ids: &[i64]) -> Result<Vec<Feature>> {
        common::fetch_where_in(&self.pool, "features", FEATURE_COLUMNS, "tool_id", tool_ids, "id")
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Feature>> {
        common::fetch_by_id(&self.pool, "features", FEATURE_COLUMNS, id).await
    }

    async fn create(&self, input: &FeatureInput) -> Result<Feature> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query("INSERT INTO features (tool_id, name, description, icon) VALUES (?, ?, ?, ?)")
                .bind(input.tool_id)
                .bind(&input.name)
                .bind(&input.description)
                .bind(&input.icon)
                .execute(conn)
                .await
                .context("Failed to create feature")?
                .inserted_id()
        });
        self.get_by_id(id)
            .await?
            .context("Feature missing after insert")
    }

    async fn update(&self, id: i64, input: &FeatureInput) -> Result<Option<Feature>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE features SET tool_id = ?, name = ?, description = ?, icon = ? WHERE id = ?",
            )
            .bind(input.tool_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.icon)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update feature")?
            .rows_affected()
        });
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, "features", id).await
    }
}
