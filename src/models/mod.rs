//! Data models
//!
//! Stored rows (`FromRow`), their API representations and the writable
//! input shape of each resource.

mod ai_tool;
mod article;
mod category;
mod comparison;
mod field_errors;
mod lead;
mod pricing_plan;
mod review;
mod session;
mod site_stat;
mod tool_media;
mod user;

pub use ai_tool::{AiTool, AiToolDetail, AiToolInput, InvalidPricingType, PricingType, PRICING_TYPES};
pub use article::{Article, ArticleDetail, ArticleInput};
pub use category::{Category, CategoryInput, CategoryWithCount};
pub use comparison::{Comparison, ComparisonDetail, ComparisonInput};
pub use field_errors::{FieldErrors, NON_FIELD_ERRORS};
pub use lead::{
    ContactSubmission, ContactSubmissionInput, NewsletterSubscriber, NewsletterSubscriberInput,
    ToolSubmission, ToolSubmissionInput,
};
pub use pricing_plan::{PricingPlan, PricingPlanInput};
pub use review::{Review, ReviewInput, MAX_RATING, MIN_RATING};
pub use session::{Session, SESSION_LIFETIME_DAYS};
pub use site_stat::{SiteStat, SiteStatInput};
pub use tool_media::{Feature, FeatureInput, ToolImage, ToolImageInput, ToolVideo, ToolVideoInput};
pub use user::{CreateUserInput, InvalidRole, User, UserRole};
