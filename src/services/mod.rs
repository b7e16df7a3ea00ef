//! Services layer - Business logic
//!
//! One service per resource validates writes, assembles representations
//! and invalidates cached pages. [`Services::build`] wires them all
//! together and registers the resources for the generic HTTP handlers.

pub mod admin;
pub mod ai_tool;
pub mod article;
pub mod category;
pub mod comparison;
pub mod error;
pub mod home;
pub mod lead;
pub mod password;
pub mod pricing_plan;
pub mod resource;
pub mod review;
pub mod site_stat;
pub mod slug;
pub mod tool_media;
pub mod user;
pub mod validation;

use std::sync::Arc;

use crate::cache::Cache;
use crate::db::repositories::*;
use crate::db::DynDatabasePool;

pub use admin::{AdminService, ModelAdmin, MODEL_ADMINS};
pub use ai_tool::{AiToolRepositories, AiToolService};
pub use article::ArticleService;
pub use category::CategoryService;
pub use comparison::ComparisonService;
pub use error::ServiceError;
pub use home::{HomeContext, HomeService};
pub use lead::{ContactService, NewsletterService, ToolSubmissionService};
pub use password::{hash_password, verify_password};
pub use pricing_plan::PricingPlanService;
pub use resource::{DynResource, Invalidator, Resource, ResourceRegistry};
pub use review::ReviewService;
pub use site_stat::SiteStatService;
pub use slug::slugify;
pub use tool_media::{FeatureService, ToolImageService, ToolVideoService};
pub use user::{UserService, UserServiceError};

/// Every service the application uses
#[derive(Clone)]
pub struct Services {
    pub cache: Arc<Cache>,
    pub registry: Arc<ResourceRegistry>,
    pub categories: Arc<CategoryService>,
    pub ai_tools: Arc<AiToolService>,
    pub articles: Arc<ArticleService>,
    pub newsletter: Arc<NewsletterService>,
    pub users: Arc<UserService>,
    pub home: Arc<HomeService>,
    pub admin: Arc<AdminService>,
}

impl Services {
    pub fn build(pool: DynDatabasePool, cache: Arc<Cache>) -> Self {
        let invalidator = Invalidator::new(cache.clone());

        let categories = Arc::new(CategoryService::new(
            SqlxCategoryRepository::boxed(pool.clone()),
            invalidator.clone(),
        ));
        let pricing_plans = Arc::new(PricingPlanService::new(
            SqlxPricingPlanRepository::boxed(pool.clone()),
            invalidator.clone(),
        ));
        let ai_tools = Arc::new(AiToolService::new(
            AiToolRepositories {
                tools: SqlxAiToolRepository::boxed(pool.clone()),
                images: SqlxToolImageRepository::boxed(pool.clone()),
                videos: SqlxToolVideoRepository::boxed(pool.clone()),
                features: SqlxFeatureRepository::boxed(pool.clone()),
                reviews: SqlxReviewRepository::boxed(pool.clone()),
            },
            pool.clone(),
            invalidator.clone(),
        ));
        let tool_images = Arc::new(ToolImageService::new(
            SqlxToolImageRepository::boxed(pool.clone()),
            pool.clone(),
            invalidator.clone(),
        ));
        let tool_videos = Arc::new(ToolVideoService::new(
            SqlxToolVideoRepository::boxed(pool.clone()),
            pool.clone(),
            invalidator.clone(),
        ));
        let features = Arc::new(FeatureService::new(
            SqlxFeatureRepository::boxed(pool.clone()),
            pool.clone(),
            invalidator.clone(),
        ));
        let reviews = Arc::new(ReviewService::new(
            SqlxReviewRepository::boxed(pool.clone()),
            pool.clone(),
            invalidator.clone(),
        ));
        let comparisons = Arc::new(ComparisonService::new(
            SqlxComparisonRepository::boxed(pool.clone()),
            ai_tools.clone(),
            pool.clone(),
            invalidator.clone(),
        ));
        let articles = Arc::new(ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            pool.clone(),
            invalidator.clone(),
        ));
        let newsletter = Arc::new(NewsletterService::new(
            SqlxNewsletterSubscriberRepository::boxed(pool.clone()),
            invalidator.clone(),
        ));
        let contacts = Arc::new(ContactService::new(
            SqlxContactSubmissionRepository::boxed(pool.clone()),
            invalidator.clone(),
        ));
        let tool_submissions = Arc::new(ToolSubmissionService::new(
            SqlxToolSubmissionRepository::boxed(pool.clone()),
            pool.clone(),
            invalidator.clone(),
        ));
        let site_stats = Arc::new(SiteStatService::new(
            SqlxSiteStatRepository::boxed(pool.clone()),
            invalidator.clone(),
        ));

        let mut registry = ResourceRegistry::new();
        registry.register(categories.clone());
        registry.register(pricing_plans);
        registry.register(ai_tools.clone());
        registry.register(tool_images);
        registry.register(tool_videos);
        registry.register(features);
        registry.register(reviews);
        registry.register(comparisons);
        registry.register(articles.clone());
        registry.register(newsletter.clone());
        registry.register(contacts);
        registry.register(tool_submissions);
        registry.register(site_stats.clone());
        let registry = Arc::new(registry);

        let users = Arc::new(UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        ));
        let home = Arc::new(HomeService::new(
            categories.clone(),
            ai_tools.clone(),
            site_stats,
            articles.clone(),
            invalidator,
        ));
        let admin = Arc::new(AdminService::new(registry.clone()));

        Self {
            cache,
            registry,
            categories,
            ai_tools,
            articles,
            newsletter,
            users,
            home,
            admin,
        }
    }
}
