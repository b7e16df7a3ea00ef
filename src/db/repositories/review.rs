//! Review repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::common;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{Review, ReviewInput};

const TABLE: &str = "reviews";
const COLUMNS: &str =
    "id, tool_id, user_id, rating, title, content, is_approved, created_at, updated_at";

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<Review>, i64)>;

    /// Reviews of the given tools, newest first
    async fn list_for_tools(&self, tool_ids: &[i64]) -> Result<Vec<Review>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>>;

    /// Insert a validated review; `rating` must already be in range
    async fn create(&self, input: &ReviewInput) -> Result<Review>;

    async fn update(&self, id: i64, input: &ReviewInput) -> Result<Option<Review>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Approve or unapprove reviews; returns the number of rows touched
    async fn set_approved(&self, ids: &[i64], approved: bool) -> Result<u64>;
}

pub struct SqlxReviewRepository {
    pool: DynDatabasePool,
}

impl SqlxReviewRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReviewRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<Review>, i64)> {
        common::fetch_page(&self.pool, query, COLUMNS).await
    }

    async fn list_for_tools(&self, tool_ids: &[i64]) -> Result<Vec<Review>> {
        common::fetch_where_in(
            &self.pool,
            TABLE,
            COLUMNS,
            "tool_id",
            tool_ids,
            "created_at DESC, id DESC",
        )
        .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>> {
        common::fetch_by_id(&self.pool, TABLE, COLUMNS, id).await
    }

    async fn create(&self, input: &ReviewInput) -> Result<Review> {
        let now = Utc::now();
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO reviews (tool_id, user_id, rating, title, content, is_approved, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(input.tool_id)
            .bind(input.user_id)
            .bind(input.rating)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.is_approved)
            .bind(now)
            .bind(now)
            .execute(conn)
            .await
            .context("Failed to create review")?
            .inserted_id()
        });

        self.get_by_id(id)
            .await?
            .context("Review missing after insert")
    }

    async fn update(&self, id: i64, input: &ReviewInput) -> Result<Option<Review>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE reviews SET tool_id = ?, user_id = ?, rating = ?, title = ?, content = ?, \
                 is_approved = ?, updated_at = ? WHERE id = ?",
            )
            .bind(input.tool_id)
            .bind(input.user_id)
            .bind(input.rating)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.is_approved)
            .bind(Utc::now())
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update review")?
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

    async fn set_approved(&self, ids: &[i64], approved: bool) -> Result<u64> {
        common::set_flag(&self.pool, TABLE, "is_approved", approved, ids).await
    }
}
