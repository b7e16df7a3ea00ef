//! AI tool repository
//!
//! Tool rows, their category and pricing plan links, and the owned image,
//! video and feature rows that the admin console edits inline. Link and
//! child writes run in the same transaction as the tool row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::common;
use crate::db::{replace_links, with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{AiTool, AiToolInput, FeatureInput, ToolImageInput, ToolVideoInput};

const TABLE: &str = "ai_tools";
const COLUMNS: &str = "id, name, slug, short_description, long_description, website_url, logo, \
                       logo_url, featured, pricing_type, launch_date, created_by, is_verified, \
                       views, created_at, updated_at";

/// Replacement sets for a tool's owned rows; `None` leaves that kind untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolChildren {
    pub images: Option<Vec<ToolImageInput>>,
    pub videos: Option<Vec<ToolVideoInput>>,
    pub features: Option<Vec<FeatureInput>>,
}

/// AI tool repository trait
#[async_trait]
pub trait AiToolRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<AiTool>, i64)>;

    async fn get_by_id(&self, id: i64) -> Result<Option<AiTool>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<AiTool>>;

    /// Tools by id, in the order of `ids`; unknown ids are skipped
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<AiTool>>;

    /// Insert a tool with its category and pricing plan links
    async fn create(&self, input: &AiToolInput) -> Result<AiTool>;

    async fn update(&self, id: i64, input: &AiToolInput) -> Result<Option<AiTool>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Add one view; returns the new count or `None` if the tool is gone
    async fn increment_views(&self, id: i64) -> Result<Option<i64>>;

    /// Category ids per tool
    async fn category_ids(&self, tool_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>>;

    /// Pricing plan ids per tool
    async fn pricing_plan_ids(&self, tool_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>>;

    /// Featured tools, newest first
    async fn featured(&self, limit: i64) -> Result<Vec<AiTool>>;

    /// Verified tools, newest first
    async fn latest_verified(&self, limit: i64) -> Result<Vec<AiTool>>;

    /// Every verified tool ordered by name
    async fn verified_by_name(&self) -> Result<Vec<AiTool>>;

    /// Replace the supplied kinds of owned rows in one transaction
    async fn replace_children(&self, tool_id: i64, children: &ToolChildren) -> Result<()>;
}

/// SQLx-based AI tool repository implementation
pub struct SqlxAiToolRepository {
    pool: DynDatabasePool,
}

impl SqlxAiToolRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AiToolRepository> {
        Arc::new(Self::new(pool))
    }

    async fn select(&self, condition: &str, order: &str, limit: Option<i64>) -> Result<Vec<AiTool>> {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            COLUMNS, TABLE, condition, order
        );
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }
        with_pool!(self.pool, |conn, Db| {
            let mut query = sqlx::query_as::<Db, AiTool>(&sql);
            if let Some(limit) = limit {
                query = query.bind(limit);
            }
            query.fetch_all(conn).await.context("Failed to list tools")
        })
    }
}

#[async_trait]
impl AiToolRepository for SqlxAiToolRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<AiTool>, i64)> {
        common::fetch_page(&self.pool, query, COLUMNS).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<AiTool>> {
        common::fetch_by_id(&self.pool, TABLE, COLUMNS, id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<AiTool>> {
        let sql = format!("SELECT {} FROM {} WHERE slug = ?", COLUMNS, TABLE);
        with_pool!(self.pool, |conn, Db| {
            sqlx::query_as::<Db, AiTool>(&sql)
                .bind(slug)
                .fetch_optional(conn)
                .await
                .context("Failed to get tool by slug")
        })
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<AiTool>> {
        let tools: Vec<AiTool> =
            common::fetch_where_in(&self.pool, TABLE, COLUMNS, "id", ids, "id").await?;
        let mut by_id: HashMap<i64, AiTool> = tools.into_iter().map(|t| (t.id, t)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn create(&self, input: &AiToolInput) -> Result<AiTool> {
        let now = Utc::now();
        let id = with_pool!(self.pool, |conn| {
            let mut tx = conn.begin().await?;
            let id = sqlx::query(
                "INSERT INTO ai_tools (name, slug, short_description, long_description, website_url, \
                 logo, logo_url, featured, pricing_type, launch_date, created_by, is_verified, views, \
                 created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
            )
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.short_description)
            .bind(&input.long_description)
            .bind(&input.website_url)
            .bind(&input.logo)
            .bind(&input.logo_url)
            .bind(input.featured)
            .bind(&input.pricing_type)
            .bind(input.launch_date)
            .bind(input.created_by)
            .bind(input.is_verified)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create tool")?
            .inserted_id();

            replace_links!(tx, "tool_categories", "tool_id", "category_id", id, input.categories);
            replace_links!(tx, "tool_pricing_plans", "tool_id", "pricing_plan_id", id, input.pricing_plans);
            tx.commit().await?;
            id
        });

        self.get_by_id(id).await?.context("Tool missing after insert")
    }

    async fn update(&self, id: i64, input: &AiToolInput) -> Result<Option<AiTool>> {
        let affected = with_pool!(self.pool, |conn| {
            let mut tx = conn.begin().await?;
            let affected = sqlx::query(
                "UPDATE ai_tools SET name = ?, slug = ?, short_description = ?, long_description = ?, \
                 website_url = ?, logo = ?, logo_url = ?, featured = ?, pricing_type = ?, launch_date = ?, \
                 created_by = ?, is_verified = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.short_description)
            .bind(&input.long_description)
            .bind(&input.website_url)
            .bind(&input.logo)
            .bind(&input.logo_url)
            .bind(input.featured)
            .bind(&input.pricing_type)
            .bind(input.launch_date)
            .bind(input.created_by)
            .bind(input.is_verified)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update tool")?
            .rows_affected();

            if affected > 0 {
                replace_links!(tx, "tool_categories", "tool_id", "category_id", id, input.categories);
                replace_links!(tx, "tool_pricing_plans", "tool_id", "pricing_plan_id", id, input.pricing_plans);
            }
            tx.commit().await?;
            affected
        });

        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, TABLE, id).await
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        common::value_taken(&self.pool, TABLE, "slug", slug, exclude_id).await
    }

    async fn increment_views(&self, id: i64) -> Result<Option<i64>> {
        common::increment_views(&self.pool, TABLE, id).await
    }

    async fn category_ids(&self, tool_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        common::fetch_links(&self.pool, "tool_categories", "tool_id", "category_id", tool_ids).await
    }

    async fn pricing_plan_ids(&self, tool_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        common::fetch_links(
            &self.pool,
            "tool_pricing_plans",
            "tool_id",
            "pricing_plan_id",
            tool_ids,
        )
        .await
    }

    async fn featured(&self, limit: i64) -> Result<Vec<AiTool>> {
        self.select("featured = 1", "created_at DESC, id DESC", Some(limit))
            .await
    }

    async fn latest_verified(&self, limit: i64) -> Result<Vec<AiTool>> {
        self.select("is_verified = 1", "created_at DESC, id DESC", Some(limit))
            .await
    }

    async fn verified_by_name(&self) -> Result<Vec<AiTool>> {
        self.select("is_verified = 1", "name, id", None).await
    }

    async fn replace_children(&self, tool_id: i64, children: &ToolChildren) -> Result<()> {
        with_pool!(self.pool, |conn| {
            let mut tx = conn.begin().await?;

            if let Some(images) = &children.images {
                sqlx::query("DELETE FROM tool_images WHERE tool_id = ?")
                    .bind(tool_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to clear tool images")?;
                for image in images {
                    sqlx::query(
                        "INSERT INTO tool_images (tool_id, image, caption, is_featured) VALUES (?, ?, ?, ?)",
                    )
                    .bind(tool_id)
                    .bind(&image.image)
                    .bind(&image.caption)
                    .bind(image.is_featured)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to write tool image")?;
                }
            }

            if let Some(videos) = &children.videos {
                sqlx::query("DELETE FROM tool_videos WHERE tool_id = ?")
                    .bind(tool_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to clear tool videos")?;
                for video in videos {
                    sqlx::query(
                        "INSERT INTO tool_videos (tool_id, video_url, caption, is_featured) VALUES (?, ?, ?, ?)",
                    )
                    .bind(tool_id)
                    .bind(&video.video_url)
                    .bind(&video.caption)
                    .bind(video.is_featured)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to write tool video")?;
                }
            }

            if let Some(features) = &children.features {
                sqlx::query("DELETE FROM features WHERE tool_id = ?")
                    .bind(tool_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to clear features")?;
                for feature in features {
                    sqlx::query(
                        "INSERT INTO features (tool_id, name, description, icon) VALUES (?, ?, ?, ?)",
                    )
                    .bind(tool_id)
                    .bind(&feature.name)
                    .bind(&feature.description)
                    .bind(&feature.icon)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to write feature")?;
                }
            }

            tx.commit().await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::db::repositories::{CategoryRepository, SqlxCategoryRepository};
    use crate::models::CategoryInput;

    async fn setup() -> (DynDatabasePool, SqlxAiToolRepository, i64) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let category = SqlxCategoryRepository::new(pool.clone())
            .create(&CategoryInput {
                name: "Writing".to_string(),
                slug: "writing".to_string(),
                icon: "fa-pen".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        let repo = SqlxAiToolRepository::new(pool.clone());
        (pool, repo, category.id)
    }

    fn tool(name: &str, category_id: i64) -> AiToolInput {
        AiToolInput {
            name: name.to_string(),
            slug: name.to_lowercase(),
            short_description: "short".to_string(),
            long_description: "long".to_string(),
            website_url: "https://example.com".to_string(),
            pricing_type: "freemium".to_string(),
            categories: vec![category_id],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_writes_links() {
        let (_pool, repo, category_id) = setup().await;

        let created = repo.create(&tool("Writer", category_id)).await.unwrap();
        assert_eq!(created.views, 0);
        assert_eq!(created.pricing_type, crate::models::PricingType::Freemium);

        let links = repo.category_ids(&[created.id]).await.unwrap();
        assert_eq!(links.get(&created.id), Some(&vec![category_id]));
        let plans = repo.pricing_plan_ids(&[created.id]).await.unwrap();
        assert!(plans.get(&created.id).is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_links_and_keeps_views() {
        let (pool, repo, category_id) = setup().await;
        let created = repo.create(&tool("Writer", category_id)).await.unwrap();
        repo.increment_views(created.id).await.unwrap();

        let other = SqlxCategoryRepository::new(pool)
            .create(&CategoryInput {
                name: "Code".to_string(),
                slug: "code".to_string(),
                icon: "fa-code".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        let mut input = tool("Writer Pro", category_id);
        input.categories = vec![other.id, other.id];
        let updated = repo.update(created.id, &input).await.unwrap().unwrap();

        assert_eq!(updated.name, "Writer Pro");
        assert_eq!(updated.views, 1);
        let links = repo.category_ids(&[created.id]).await.unwrap();
        assert_eq!(links[&created.id], vec![other.id]);
    }

    #[tokio::test]
    async fn test_increment_views_is_monotonic() {
        let (_pool, repo, category_id) = setup().await;
        let created = repo.create(&tool("Counter", category_id)).await.unwrap();

        let mut last = 0;
        for _ in 0..5 {
            let views = repo.increment_views(created.id).await.unwrap().unwrap();
            assert!(views > last);
            last = views;
        }
        assert_eq!(last, 5);
        assert_eq!(repo.increment_views(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_homepage_selections() {
        let (_pool, repo, category_id) = setup().await;
        let mut featured = tool("Zed", category_id);
        featured.featured = true;
        featured.is_verified = true;
        repo.create(&featured).await.unwrap();
        let mut verified = tool("Alpha", category_id);
        verified.is_verified = true;
        repo.create(&verified).await.unwrap();
        repo.create(&tool("Hidden", category_id)).await.unwrap();

        let names = |tools: Vec<AiTool>| tools.into_iter().map(|t| t.name).collect::<Vec<_>>();
        assert_eq!(names(repo.featured(6).await.unwrap()), vec!["Zed"]);
        assert_eq!(names(repo.latest_verified(6).await.unwrap()), vec!["Alpha", "Zed"]);
        assert_eq!(names(repo.verified_by_name().await.unwrap()), vec!["Alpha", "Zed"]);
        assert_eq!(repo.latest_verified(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_many_keeps_requested_order() {
        let (_pool, repo, category_id) = setup().await;
        let a = repo.create(&tool("A", category_id)).await.unwrap();
        let b = repo.create(&tool("B", category_id)).await.unwrap();

        let tools = repo.get_many(&[b.id, 999, a.id]).await.unwrap();
        let ids: Vec<i64> = tools.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_replace_children_only_touches_supplied_kinds() {
        let (pool, repo, category_id) = setup().await;
        let created = repo.create(&tool("Media", category_id)).await.unwrap();

        repo.replace_children(
            created.id,
            &ToolChildren {
                images: Some(vec![ToolImageInput {
                    image: "tool_images/a.png".to_string(),
                    ..Default::default()
                }]),
                features: Some(vec![
                    FeatureInput {
                        name: "Fast".to_string(),
                        ..Default::default()
                    },
                    FeatureInput {
                        name: "Cheap".to_string(),
                        ..Default::default()
                    },
                ]),
                videos: None,
            },
        )
        .await
        .unwrap();

        repo.replace_children(
            created.id,
            &ToolChildren {
                features: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let sqlite = pool.as_sqlite().unwrap();
        let images: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tool_images")
            .fetch_one(sqlite)
            .await
            .unwrap();
        let features: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM features")
            .fetch_one(sqlite)
            .await
            .unwrap();
        assert_eq!(images, 1);
        assert_eq!(features, 0);
    }
}
