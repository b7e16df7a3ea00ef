//! Category repository
//!
//! Database operations for categories.
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` implementing the trait for SQLite and MySQL

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::common;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{Category, CategoryInput, CategoryWithCount};

const TABLE: &str = "categories";
const COLUMNS: &str = "id, name, slug, icon, description, created_at, updated_at";

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// One page of categories plus the total matching count
    async fn list(&self, query: &ListSql) -> Result<(Vec<Category>, i64)>;

    /// All categories by name, each with the number of tools filed under it
    async fn list_with_tool_counts(&self) -> Result<Vec<CategoryWithCount>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    async fn create(&self, input: &CategoryInput) -> Result<Category>;

    /// Replace every writable field; `None` if the row is gone
    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

/// SQLx-based category repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<Category>, i64)> {
        common::fetch_page(&self.pool, query, COLUMNS).await
    }

    async fn list_with_tool_counts(&self) -> Result<Vec<CategoryWithCount>> {
        let sql = "SELECT c.id, c.name, c.slug, c.icon, c.description, c.created_at, c.updated_at, \
                   COUNT(tc.tool_id) AS tool_count \
                   FROM categories c \
                   LEFT JOIN tool_categories tc ON tc.category_id = c.id \
                   GROUP BY c.id, c.name, c.slug, c.icon, c.description, c.created_at, c.updated_at \
                   ORDER BY c.name, c.id";
        with_pool!(self.pool, |conn, Db| {
            sqlx::query_as::<Db, CategoryWithCount>(sql)
                .fetch_all(conn)
                .await
                .context("Failed to count tools per category")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        common::fetch_by_id(&self.pool, TABLE, COLUMNS, id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM {} WHERE slug = ?", COLUMNS, TABLE);
        with_pool!(self.pool, |conn, Db| {
            sqlx::query_as::<Db, Category>(&sql)
                .bind(slug)
                .fetch_optional(conn)
                .await
                .context("Failed to get category by slug")
        })
    }

    async fn create(&self, input: &CategoryInput) -> Result<Category> {
        let now = Utc::now();
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO categories (name, slug, icon, description, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.icon)
            .bind(&input.description)
            .bind(now)
            .bind(now)
            .execute(conn)
            .await
            .context("Failed to create category")?
            .inserted_id()
        });

        self.get_by_id(id)
            .await?
            .context("Category missing after insert")
    }

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE categories SET name = ?, slug = ?, icon = ?, description = ?, updated_at = ? \
                 WHERE id = ?",
            )
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.icon)
            .bind(&input.description)
            .bind(Utc::now())
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update category")?
            .rows_affected()
        });

        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, TABLE, id).await
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        common::value_taken(&self.pool, TABLE, "name", name, exclude_id).await
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        common::value_taken(&self.pool, TABLE, "slug", slug, exclude_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations, ListQuery};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxCategoryRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        let repo = SqlxCategoryRepository::new(pool.clone());
        (pool, repo)
    }

    fn input(name: &str, slug: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            slug: slug.to_string(),
            icon: "fa-pen".to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo.create(&input("Writing", "writing")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.slug, "writing");

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id, created);
        let by_slug = repo.get_by_slug("writing").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_name() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&input("Video", "video")).await.unwrap();
        repo.create(&input("Audio", "audio")).await.unwrap();
        repo.create(&input("Code", "code")).await.unwrap();

        let spec = crate::db::ListSpec {
            table: TABLE,
            search: &["name"],
            filters: &[],
            ordering: &["name"],
            default_order: "name",
        };
        let sql = ListQuery::default().compile(&spec).unwrap();
        let (rows, total) = repo.list(&sql).await.unwrap();

        assert_eq!(total, 3);
        let names: Vec<&str> = rows.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Audio", "Code", "Video"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&input("Writing", "writing")).await.unwrap();

        let updated = repo
            .update(created.id, &input("Copywriting", "copywriting"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Copywriting");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        assert!(repo.update(999, &input("x", "x")).await.unwrap().is_none());

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_name_and_slug_taken() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&input("Writing", "writing")).await.unwrap();

        assert!(repo.name_taken("Writing", None).await.unwrap());
        assert!(!repo.name_taken("Writing", Some(created.id)).await.unwrap());
        assert!(repo.slug_taken("writing", None).await.unwrap());
        assert!(!repo.slug_taken("other", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_tool_counts_include_empty_categories() {
        let (pool, repo) = setup_test_repo().await;
        let busy = repo.create(&input("Busy", "busy")).await.unwrap();
        repo.create(&input("Empty", "empty")).await.unwrap();

        let sqlite = pool.as_sqlite().unwrap();
        let now = Utc::now();
        for slug in ["one", "two"] {
            let tool_id = sqlx::query(
                "INSERT INTO ai_tools (name, slug, short_description, long_description, website_url, pricing_type, created_at, updated_at) \
                 VALUES (?, ?, 's', 'l', 'https://example.com', 'free', ?, ?)",
            )
            .bind(slug)
            .bind(slug)
            .bind(now)
            .bind(now)
            .execute(sqlite)
            .await
            .unwrap()
            .last_insert_rowid();
            sqlx::query("INSERT INTO tool_categories (tool_id, category_id) VALUES (?, ?)")
                .bind(tool_id)
                .bind(busy.id)
                .execute(sqlite)
                .await
                .unwrap();
        }

        let counts = repo.list_with_tool_counts().await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].category.name, "Busy");
        assert_eq!(counts[0].tool_count, 2);
        assert_eq!(counts[1].tool_count, 0);
    }
}
