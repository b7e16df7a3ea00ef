//! Article repository
//!
//! Database operations for articles.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL
//!
//! Category and related-tool links are written in the same transaction as
//! the article row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use super::common;
use crate::db::{replace_links, with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{Article, ArticleInput};

const TABLE: &str = "articles";
const COLUMNS: &str = "id, title, slug, content, excerpt, author_id, featured_image, \
                       is_published, views, created_at, updated_at";

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// List one page of articles
    async fn list(&self, query: &ListSql) -> Result<(Vec<Article>, i64)>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Create a new article with its links
    async fn create(&self, input: &ArticleInput) -> Result<Article>;

    /// Replace an article's fields and links
    async fn update(&self, id: i64, input: &ArticleInput) -> Result<Option<Article>>;

    /// Delete an article
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a slug exists for a different article
    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Add one view and return the new count
    async fn increment_views(&self, id: i64) -> Result<Option<i64>>;

    /// Category ids per article
    async fn category_ids(&self, article_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>>;

    /// Related tool ids per article
    async fn related_tool_ids(&self, article_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>>;

    /// Published articles, newest first
    async fn latest_published(&self, limit: i64) -> Result<Vec<Article>>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<Article>, i64)> {
        common::fetch_page(&self.pool, query, COLUMNS).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        common::fetch_by_id(&self.pool, TABLE, COLUMNS, id).await
    }

    async fn create(&self, input: &ArticleInput) -> Result<Article> {
        let now = Utc::now();
        let id = with_pool!(self.pool, |conn| {
            let mut tx = conn.begin().await?;
            let id = sqlx::query(
                "INSERT INTO articles (title, slug, content, excerpt, author_id, featured_image, \
                 is_published, views, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
            )
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.content)
            .bind(&input.excerpt)
            .bind(input.author_id)
            .bind(&input.featured_image)
            .bind(input.is_published)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create article")?
            .inserted_id();

            replace_links!(tx, "article_categories", "article_id", "category_id", id, input.categories);
            replace_links!(tx, "article_related_tools", "article_id", "tool_id", id, input.related_tools);
            tx.commit().await?;
            id
        });

        self.get_by_id(id)
            .await?
            .context("Article missing after insert")
    }

    async fn update(&self, id: i64, input: &ArticleInput) -> Result<Option<Article>> {
        let affected = with_pool!(self.pool, |conn| {
            let mut tx = conn.begin().await?;
            let affected = sqlx::query(
                "UPDATE articles SET title = ?, slug = ?, content = ?, excerpt = ?, author_id = ?, \
                 featured_image = ?, is_published = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.content)
            .bind(&input.excerpt)
            .bind(input.author_id)
            .bind(&input.featured_image)
            .bind(input.is_published)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update article")?
            .rows_affected();

            if affected > 0 {
                replace_links!(tx, "article_categories", "article_id", "category_id", id, input.categories);
                replace_links!(tx, "article_related_tools", "article_id", "tool_id", id, input.related_tools);
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

    async fn category_ids(&self, article_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        common::fetch_links(
            &self.pool,
            "article_categories",
            "article_id",
            "category_id",
            article_ids,
        )
        .await
    }

    async fn related_tool_ids(&self, article_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        common::fetch_links(
            &self.pool,
            "article_related_tools",
            "article_id",
            "tool_id",
            article_ids,
        )
        .await
    }

    async fn latest_published(&self, limit: i64) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE is_published = 1 ORDER BY created_at DESC, id DESC LIMIT ?",
            COLUMNS, TABLE
        );
        with_pool!(self.pool, |conn, Db| {
            sqlx::query_as::<Db, Article>(&sql)
                .bind(limit)
                .fetch_all(conn)
                .await
                .context("Failed to list published articles")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn setup() -> (DynDatabasePool, SqlxArticleRepository) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        (pool.clone(), SqlxArticleRepository::new(pool))
    }

    fn article(title: &str, published: bool) -> ArticleInput {
        ArticleInput {
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            content: "Body".to_string(),
            is_published: published,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_article() {
        let (_pool, repo) = setup().await;
        let created = repo.create(&article("Hello World", true)).await.unwrap();

        assert_eq!(created.slug, "hello-world");
        assert_eq!(created.views, 0);
        assert_eq!(created.featured_image, None);
        assert!(repo.category_ids(&[created.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_links_follow_updates() {
        let (pool, repo) = setup().await;
        let now = Utc::now();
        let category_id = sqlx::query(
            "INSERT INTO categories (name, slug, icon, description, created_at, updated_at) VALUES ('News', 'news', '', '', ?, ?)",
        )
        .bind(now)
        .bind(now)
        .execute(pool.as_sqlite().unwrap())
        .await
        .unwrap()
        .last_insert_rowid();

        let mut input = article("Linked", false);
        input.categories = vec![category_id];
        let created = repo.create(&input).await.unwrap();
        assert_eq!(
            repo.category_ids(&[created.id]).await.unwrap()[&created.id],
            vec![category_id]
        );

        input.categories.clear();
        repo.update(created.id, &input).await.unwrap().unwrap();
        assert!(repo.category_ids(&[created.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_published_skips_drafts() {
        let (_pool, repo) = setup().await;
        for i in 0..4 {
            repo.create(&article(&format!("Post {}", i), true)).await.unwrap();
        }
        repo.create(&article("Draft", false)).await.unwrap();

        let latest = repo.latest_published(3).await.unwrap();
        let titles: Vec<&str> = latest.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 3", "Post 2", "Post 1"]);
    }

    #[tokio::test]
    async fn test_views_increment() {
        let (_pool, repo) = setup().await;
        let created = repo.create(&article("Counted", true)).await.unwrap();
        assert_eq!(repo.increment_views(created.id).await.unwrap(), Some(1));
        assert_eq!(repo.increment_views(created.id).await.unwrap(), Some(2));
        assert!(repo.delete(created.id).await.unwrap());
        assert_eq!(repo.increment_views(created.id).await.unwrap(), None);
    }
}
