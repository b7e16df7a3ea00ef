//! Site statistic service

use async_trait::async_trait;
use std::sync::Arc;

use super::resource::{Invalidator, Resource};
use super::validation::Validator;
use super::ServiceError;
use crate::db::repositories::SiteStatRepository;
use crate::db::{FilterField, FilterKind, ListQuery, ListSpec, Page};
use crate::models::{SiteStat, SiteStatInput};

const CACHE_PREFIX: &str = "site_stat";

pub static SITE_STAT_LIST: ListSpec = ListSpec {
    table: "site_stats",
    search: &["stat_name", "stat_value"],
    filters: &[FilterField {
        param: "is_active",
        kind: FilterKind::Bool("is_active"),
    }],
    ordering: &["stat_name"],
    default_order: "id ASC",
};

pub struct SiteStatService {
    repo: Arc<dyn SiteStatRepository>,
    invalidator: Invalidator,
}

impl SiteStatService {
    pub fn new(repo: Arc<dyn SiteStatRepository>, invalidator: Invalidator) -> Self {
        Self { repo, invalidator }
    }

    /// Stats shown on the homepage
    pub async fn active(&self) -> Result<Vec<SiteStat>, ServiceError> {
        Ok(self.repo.active().await?)
    }

    async fn validate(&self, input: &SiteStatInput, id: Option<i64>) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("stat_name", &input.stat_name, 100)
            .text("stat_value", &input.stat_value, 100)
            .max_chars("icon", &input.icon, 50);
        if !v.has("stat_name") && self.repo.name_taken(&input.stat_name, id).await? {
            v.add("stat_name", "site stat with this stat name already exists.");
        }
        v.finish()
    }
}

#[async_trait]
impl Resource for SiteStatService {
    type Repr = SiteStat;
    type Input = SiteStatInput;

    fn name(&self) -> &'static str {
        "site-stats"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &SITE_STAT_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<SiteStat>, ServiceError> {
        let sql = query.compile(&SITE_STAT_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<SiteStat, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Site stat"))
    }

    async fn create(&self, input: SiteStatInput) -> Result<SiteStat, ServiceError> {
        self.validate(&input, None).await?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, input: SiteStatInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.validate(&input, Some(id)).await
    }

    async fn update(&self, id: i64, input: SiteStatInput) -> Result<SiteStat, ServiceError> {
        self.get(id).await?;
        self.validate(&input, Some(id)).await?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Site stat"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Site stat"));
        }
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, stat: &SiteStat) -> SiteStatInput {
        SiteStatInput::from(stat)
    }
}
