//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity; the
//! shared SQL helpers live in `common`.

pub mod ai_tool;
pub mod article;
pub mod category;
pub mod common;
pub mod comparison;
pub mod lead;
pub mod pricing_plan;
pub mod review;
pub mod session;
pub mod site_stat;
pub mod tool_media;
pub mod user;

pub use ai_tool::{AiToolRepository, SqlxAiToolRepository, ToolChildren};
pub use article::{ArticleRepository, SqlxArticleRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use comparison::{ComparisonRepository, SqlxComparisonRepository};
pub use lead::{
    ContactSubmissionRepository, NewsletterSubscriberRepository, SqlxContactSubmissionRepository,
    SqlxNewsletterSubscriberRepository, SqlxToolSubmissionRepository, ToolSubmissionRepository,
};
pub use pricing_plan::{PricingPlanRepository, SqlxPricingPlanRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use site_stat::{SiteStatRepository, SqlxSiteStatRepository};
pub use tool_media::{
    FeatureRepository, SqlxFeatureRepository, SqlxToolImageRepository, SqlxToolVideoRepository,
    ToolImageRepository, ToolVideoRepository,
};
pub use user::{SqlxUserRepository, UserRepository};
