//! Site statistic repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::common;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{SiteStat, SiteStatInput};

const TABLE: &str = "site_stats";
const COLUMNS: &str = "id, stat_name, stat_value, icon, is_active";

#[async_trait]
pub trait SiteStatRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<SiteStat>, i64)>;
    /// Active stats in insertion order
    async fn active(&self) -> Result<Vec<SiteStat>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<SiteStat>>;
    async fn create(&self, input: &SiteStatInput) -> Result<SiteStat>;
    async fn update(&self, id: i64, input: &SiteStatInput) -> Result<Option<SiteStat>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn name_taken(&self, stat_name: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxSiteStatRepository {
    pool: DynDatabasePool,
}

impl SqlxSiteStatRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SiteStatRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SiteStatRepository for SqlxSiteStatRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<SiteStat>, i64)> {
        common::fetch_page(&self.pool, query, COLUMNS).await
    }

    async fn active(&self) -> Result<Vec<SiteStat>> {
        let sql = format!("SELECT {} FROM {} WHERE is_active = 1 ORDER BY id", COLUMNS, TABLE);
        with_pool!(self.pool, |conn, Db| {
            sqlx::query_as::<Db, SiteStat>(&sql)
                .fetch_all(conn)
                .await
                .context("Failed to list active site stats")
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SiteStat>> {
        common::fetch_by_id(&self.pool, TABLE, COLUMNS, id).await
    }

    async fn create(&self, input: &SiteStatInput) -> Result<SiteStat> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO site_stats (stat_name, stat_value, icon, is_active) VALUES (?, ?, ?, ?)",
            )
            .bind(&input.stat_name)
            .bind(&input.stat_value)
            .bind(&input.icon)
            .bind(input.is_active)
            .execute(conn)
            .await
            .context("Failed to create site stat")?
            .inserted_id()
        });
        self.get_by_id(id)
            .await?
            .context("Site stat missing after insert")
    }

    async fn update(&self, id: i64, input: &SiteStatInput) -> Result<Option<SiteStat>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE site_stats SET stat_name = ?, stat_value = ?, icon = ?, is_active = ? WHERE id = ?",
            )
            .bind(&input.stat_name)
            .bind(&input.stat_value)
            .bind(&input.icon)
            .bind(input.is_active)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update site stat")?
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

    async fn name_taken(&self, stat_name: &str, exclude_id: Option<i64>) -> Result<bool> {
        common::value_taken(&self.pool, TABLE, "stat_name", stat_name, exclude_id).await
    }
}
