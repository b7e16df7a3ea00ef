//! Comparison repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use super::common;
use crate::db::{replace_links, with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{Comparison, ComparisonInput};

const TABLE: &str = "comparisons";
const COLUMNS: &str = "id, title, slug, content, author_id, is_published, created_at, updated_at";

#[async_trait]
pub trait ComparisonRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<Comparison>, i64)>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Comparison>>;
    async fn create(&self, input: &ComparisonInput) -> Result<Comparison>;
    async fn update(&self, id: i64, input: &ComparisonInput) -> Result<Option<Comparison>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
    /// Compared tool ids per comparison
    async fn tool_ids(&self, comparison_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>>;
}

pub struct SqlxComparisonRepository {
    pool: DynDatabasePool,
}

impl SqlxComparisonRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ComparisonRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ComparisonRepository for SqlxComparisonRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<Comparison>, i64)> {
        common::fetch_page(&self.pool, query, COLUMNS).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comparison>> {
        common::fetch_by_id(&self.pool, TABLE, COLUMNS, id).await
    }

    async fn create(&self, input: &ComparisonInput) -> Result<Comparison> {
        let now = Utc::now();
        let id = with_pool!(self.pool, |conn| {
            let mut tx = conn.begin().await?;
            let id = sqlx::query(
                "INSERT INTO comparisons (title, slug, content, author_id, is_published, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.content)
            .bind(input.author_id)
            .bind(input.is_published)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create comparison")?
            .inserted_id();

            replace_links!(tx, "comparison_tools", "comparison_id", "tool_id", id, input.tool_ids);
            tx.commit().await?;
            id
        });

        self.get_by_id(id)
            .await?
            .context("Comparison missing after insert")
    }

    async fn update(&self, id: i64, input: &ComparisonInput) -> Result<Option<Comparison>> {
        let affected = with_pool!(self.pool, |conn| {
            let mut tx = conn.begin().await?;
            let affected = sqlx::query(
                "UPDATE comparisons SET title = ?, slug = ?, content = ?, author_id = ?, is_published = ?, \
                 updated_at = ? WHERE id = ?",
            )
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.content)
            .bind(input.author_id)
            .bind(input.is_published)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update comparison")?
            .rows_affected();

            if affected > 0 {
                replace_links!(tx, "comparison_tools", "comparison_id", "tool_id", id, input.tool_ids);
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

    async fn tool_ids(&self, comparison_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        common::fetch_links(
            &self.pool,
            "comparison_tools",
            "comparison_id",
            "tool_id",
            comparison_ids,
        )
        .await
    }
}
