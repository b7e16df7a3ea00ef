//! Homepage data
//!
//! The homepage summarises every entity, so its context is built once and
//! cached under `home:context`. Any resource write clears it through the
//! [`Invalidator`], and a context built while a write landed is never kept.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ai_tool::AiToolService;
use super::article::ArticleService;
use super::category::CategoryService;
use super::resource::Invalidator;
use super::site_stat::SiteStatService;
use super::ServiceError;
use crate::cache::CacheLayer;
use crate::models::{AiTool, Article, CategoryWithCount, SiteStat};

pub const HOME_CONTEXT_KEY: &str = "home:context";

const FEATURED_LIMIT: i64 = 6;
const LATEST_LIMIT: i64 = 6;
const ARTICLE_LIMIT: i64 = 3;

/// Everything the index template renders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeContext {
    pub categories: Vec<CategoryWithCount>,
    pub featured_tools: Vec<AiTool>,
    pub latest_tools: Vec<AiTool>,
    pub stats: Vec<SiteStat>,
    pub articles: Vec<Article>,
    pub all_tools: Vec<AiTool>,
}

pub struct HomeService {
    categories: Arc<CategoryService>,
    tools: Arc<AiToolService>,
    stats: Arc<SiteStatService>,
    articles: Arc<ArticleService>,
    invalidator: Invalidator,
}

impl HomeService {
    pub fn new(
        categories: Arc<CategoryService>,
        tools: Arc<AiToolService>,
        stats: Arc<SiteStatService>,
        articles: Arc<ArticleService>,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            categories,
            tools,
            stats,
            articles,
            invalidator,
        }
    }

    /// Cached homepage context, rebuilt on a miss
    pub async fn context(&self) -> Result<HomeContext, ServiceError> {
        let cache = self.invalidator.cache();
        match cache.get::<HomeContext>(HOME_CONTEXT_KEY).await {
            Ok(Some(context)) => {
                tracing::debug!("Cache hit for {}", HOME_CONTEXT_KEY);
                return Ok(context);
            }
            Ok(None) => tracing::debug!("Cache miss for {}", HOME_CONTEXT_KEY),
            Err(e) => tracing::warn!("Failed to read {}: {}", HOME_CONTEXT_KEY, e),
        }

        let generation = self.invalidator.generation();
        let context = self.build().await?;
        self.store(&context, generation).await;
        Ok(context)
    }

    /// Cache `context` unless a write happened after `generation` was read.
    ///
    /// The generation is read again after the set, since a write landing
    /// between the check and the set may have deleted the key first.
    async fn store(&self, context: &HomeContext, generation: u64) {
        let cache = self.invalidator.cache();
        if self.invalidator.generation() != generation {
            tracing::debug!("Skipping stale {}", HOME_CONTEXT_KEY);
            return;
        }
        if let Err(e) = cache.set(HOME_CONTEXT_KEY, context, cache.default_ttl()).await {
            tracing::warn!("Failed to cache {}: {}", HOME_CONTEXT_KEY, e);
            return;
        }
        if self.invalidator.generation() != generation {
            if let Err(e) = cache.delete(HOME_CONTEXT_KEY).await {
                tracing::warn!("Failed to drop stale {}: {}", HOME_CONTEXT_KEY, e);
            }
        }
    }

    async fn build(&self) -> Result<HomeContext, ServiceError> {
        Ok(HomeContext {
            categories: self.categories.with_tool_counts().await?,
            featured_tools: self.tools.featured(FEATURED_LIMIT).await?,
            latest_tools: self.tools.latest_verified(LATEST_LIMIT).await?,
            stats: self.stats.active().await?,
            articles: self.articles.latest_published(ARTICLE_LIMIT).await?,
            all_tools: self.tools.verified_by_name().await?,
        })
    }
}
