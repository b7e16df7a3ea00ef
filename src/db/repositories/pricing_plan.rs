//! Pricing plan repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::common;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{PricingPlan, PricingPlanInput};

const TABLE: &str = "pricing_plans";
const COLUMNS: &str = "id, name, price, is_free, description";

#[async_trait]
pub trait PricingPlanRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<PricingPlan>, i64)>;
    async fn get_by_id(&self, id: i64) -> Result<Option<PricingPlan>>;
    async fn create(&self, input: &PricingPlanInput) -> Result<PricingPlan>;
    async fn update(&self, id: i64, input: &PricingPlanInput) -> Result<Option<PricingPlan>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxPricingPlanRepository {
    pool: DynDatabasePool,
}

impl SqlxPricingPlanRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PricingPlanRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PricingPlanRepository for SqlxPricingPlanRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<PricingPlan>, i64)> {
        common::fetch_page(&self.pool, query, COLUMNS).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<PricingPlan>> {
        common::fetch_by_id(&self.pool, TABLE, COLUMNS, id).await
    }

    async fn create(&self, input: &PricingPlanInput) -> Result<PricingPlan> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO pricing_plans (name, price, is_free, description) VALUES (?, ?, ?, ?)",
            )
            .bind(&input.name)
            .bind(input.price)
            .bind(input.is_free)
            .bind(&input.description)
            .execute(conn)
            .await
            .context("Failed to create pricing plan")?
            .inserted_id()
        });

        self.get_by_id(id)
            .await?
            .context("Pricing plan missing after insert")
    }

    async fn update(&self, id: i64, input: &PricingPlanInput) -> Result<Option<PricingPlan>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE pricing_plans SET name = ?, price = ?, is_free = ?, description = ? WHERE id = ?",
            )
            .bind(&input.name)
            .bind(input.price)
            .bind(input.is_free)
            .bind(&input.description)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update pricing plan")?
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
}
