//! AI tool service
//!
//! Validation and assembly of the full tool representation. A tool's
//! representation embeds its category and pricing plan ids plus the
//! feature, image, video and review rows it owns; lists load those in one
//! batch per relation rather than per tool.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::resource::{Invalidator, Resource};
use super::slug::resolve_slug;
use super::validation::Validator;
use super::ServiceError;
use crate::db::repositories::{
    AiToolRepository, FeatureRepository, ReviewRepository, ToolChildren, ToolImageRepository,
    ToolVideoRepository,
};
use crate::db::{DynDatabasePool, FilterField, FilterKind, ListQuery, ListSpec, Page};
use crate::models::{AiTool, AiToolDetail, AiToolInput, PRICING_TYPES};

const CACHE_PREFIX: &str = "ai_tool";

pub static AI_TOOL_LIST: ListSpec = ListSpec {
    table: "ai_tools",
    search: &["name", "short_description", "long_description"],
    filters: &[
        FilterField {
            param: "pricing_type",
            kind: FilterKind::Choice("pricing_type", PRICING_TYPES),
        },
        FilterField {
            param: "is_verified",
            kind: FilterKind::Bool("is_verified"),
        },
        FilterField {
            param: "featured",
            kind: FilterKind::Bool("featured"),
        },
        FilterField {
            param: "categories",
            kind: FilterKind::Related {
                join_table: "tool_categories",
                owner_column: "tool_id",
                target_column: "category_id",
            },
        },
        FilterField {
            param: "created_at",
            kind: FilterKind::Date("created_at"),
        },
    ],
    ordering: &["name", "created_at", "updated_at", "views", "featured", "launch_date"],
    default_order: "featured DESC, created_at DESC",
};

/// Repositories the tool service reads from
pub struct AiToolRepositories {
    pub tools: Arc<dyn AiToolRepository>,
    pub images: Arc<dyn ToolImageRepository>,
    pub videos: Arc<dyn ToolVideoRepository>,
    pub features: Arc<dyn FeatureRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}

pub struct AiToolService {
    repos: AiToolRepositories,
    pool: DynDatabasePool,
    invalidator: Invalidator,
}

fn group_by_tool<T>(rows: Vec<T>, tool_of: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(tool_of(&row)).or_default().push(row);
    }
    grouped
}

impl AiToolService {
    pub fn new(repos: AiToolRepositories, pool: DynDatabasePool, invalidator: Invalidator) -> Self {
        Self {
            repos,
            pool,
            invalidator,
        }
    }

    /// Attach relations to a batch of tools, keeping their order
    pub async fn details(&self, tools: Vec<AiTool>) -> Result<Vec<AiToolDetail>, ServiceError> {
        if tools.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = tools.iter().map(|t| t.id).collect();

        let mut categories = self.repos.tools.category_ids(&ids).await?;
        let mut plans = self.repos.tools.pricing_plan_ids(&ids).await?;
        let mut features = group_by_tool(self.repos.features.list_for_tools(&ids).await?, |f| f.tool_id);
        let mut images = group_by_tool(self.repos.images.list_for_tools(&ids).await?, |i| i.tool_id);
        let mut videos = group_by_tool(self.repos.videos.list_for_tools(&ids).await?, |v| v.tool_id);
        let mut reviews = group_by_tool(self.repos.reviews.list_for_tools(&ids).await?, |r| r.tool_id);

        Ok(tools
            .into_iter()
            .map(|tool| {
                let id = tool.id;
                AiToolDetail {
                    tool,
                    categories: categories.remove(&id).unwrap_or_default(),
                    pricing_plans: plans.remove(&id).unwrap_or_default(),
                    features: features.remove(&id).unwrap_or_default(),
                    images: images.remove(&id).unwrap_or_default(),
                    videos: videos.remove(&id).unwrap_or_default(),
                    reviews: reviews.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    /// Full representations for `ids`, in that order; unknown ids are skipped
    pub async fn details_for(&self, ids: &[i64]) -> Result<Vec<AiToolDetail>, ServiceError> {
        let tools = self.repos.tools.get_many(ids).await?;
        self.details(tools).await
    }

    pub async fn featured(&self, limit: i64) -> Result<Vec<AiTool>, ServiceError> {
        Ok(self.repos.tools.featured(limit).await?)
    }

    pub async fn latest_verified(&self, limit: i64) -> Result<Vec<AiTool>, ServiceError> {
        Ok(self.repos.tools.latest_verified(limit).await?)
    }

    pub async fn verified_by_name(&self) -> Result<Vec<AiTool>, ServiceError> {
        Ok(self.repos.tools.verified_by_name().await?)
    }

    /// Count one view and return the new total
    pub async fn record_view(&self, id: i64) -> Result<i64, ServiceError> {
        let views = self
            .repos
            .tools
            .increment_views(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("AI tool"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(views)
    }

    /// Replace the owned rows supplied in `children`, as the admin inline
    /// editor does, and return the updated tool
    pub async fn replace_inlines(
        &self,
        id: i64,
        children: ToolChildren,
    ) -> Result<AiToolDetail, ServiceError> {
        self.get(id).await?;

        let mut v = Validator::new();
        for (i, image) in children.images.iter().flatten().enumerate() {
            v.text(&format!("images.{}.image", i), &image.image, 255)
                .max_chars(&format!("images.{}.caption", i), &image.caption, 200);
        }
        for (i, video) in children.videos.iter().flatten().enumerate() {
            v.url(&format!("videos.{}.video_url", i), &video.video_url, 200)
                .max_chars(&format!("videos.{}.caption", i), &video.caption, 200);
        }
        for (i, feature) in children.features.iter().flatten().enumerate() {
            v.text(&format!("features.{}.name", i), &feature.name, 200)
                .max_chars(&format!("features.{}.icon", i), &feature.icon, 50);
        }
        v.finish()?;

        self.repos.tools.replace_children(id, &children).await?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        self.get(id).await
    }

    async fn validate(&self, input: &mut AiToolInput, id: Option<i64>) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("name", &input.name, 200)
            .text("short_description", &input.short_description, 300)
            .required_text("long_description", &input.long_description)
            .url("website_url", &input.website_url, 200)
            .optional_url("logo_url", input.logo_url.as_deref(), 200)
            .max_chars("logo", input.logo.as_deref().unwrap_or(""), 255)
            .non_empty("categories", &input.categories);

        if input.pricing_type.is_empty() {
            v.add("pricing_type", super::validation::BLANK);
        } else if !PRICING_TYPES.contains(&input.pricing_type.as_str()) {
            v.add(
                "pricing_type",
                format!("\"{}\" is not a valid choice.", input.pricing_type),
            );
        }

        v.exists(&self.pool, "categories", "categories", &input.categories)
            .await?;
        v.exists(&self.pool, "pricing_plans", "pricing_plans", &input.pricing_plans)
            .await?;
        v.exists_opt(&self.pool, "created_by", "users", input.created_by)
            .await?;

        let tools = &self.repos.tools;
        input.slug = resolve_slug(
            &mut v,
            &input.slug,
            &input.name,
            200,
            "ai tool with this slug already exists.",
            |candidate| async move { tools.slug_taken(&candidate, id).await },
        )
        .await?;

        v.finish()
    }
}

#[async_trait]
impl Resource for AiToolService {
    type Repr = AiToolDetail;
    type Input = AiToolInput;

    fn name(&self) -> &'static str {
        "ai-tools"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &AI_TOOL_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<AiToolDetail>, ServiceError> {
        let sql = query.compile(&AI_TOOL_LIST)?;
        let (tools, total) = self.repos.tools.list(&sql).await?;
        let details = self.details(tools).await?;
        Ok(Page::new(details, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<AiToolDetail, ServiceError> {
        let tool = self
            .repos
            .tools
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("AI tool"))?;
        self.details(vec![tool])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found("AI tool"))
    }

    async fn create(&self, mut input: AiToolInput) -> Result<AiToolDetail, ServiceError> {
        self.validate(&mut input, None).await?;
        let created = self.repos.tools.create(&input).await?;
        tracing::info!("Created AI tool {} ({})", created.name, created.id);
        self.invalidator.invalidate(CACHE_PREFIX).await;
        self.get(created.id).await
    }

    async fn check_update(&self, id: i64, mut input: AiToolInput) -> Result<(), ServiceError> {
        self.repos
            .tools
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("AI tool"))?;
        self.validate(&mut input, Some(id)).await
    }

    async fn update(&self, id: i64, mut input: AiToolInput) -> Result<AiToolDetail, ServiceError> {
        self.repos
            .tools
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("AI tool"))?;
        self.validate(&mut input, Some(id)).await?;
        self.repos
            .tools
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("AI tool"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repos.tools.delete(id).await? {
            return Err(ServiceError::not_found("AI tool"));
        }
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, detail: &AiToolDetail) -> AiToolInput {
        AiToolInput::from(detail)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::{
        SqlxAiToolRepository, SqlxFeatureRepository, SqlxReviewRepository,
        SqlxToolImageRepository, SqlxToolVideoRepository,
    };
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::{FeatureInput, ToolImageInput};
    use chrono::Utc;

    pub(crate) fn tool_service(pool: DynDatabasePool) -> AiToolService {
        AiToolService::new(
            AiToolRepositories {
                tools: SqlxAiToolRepository::boxed(pool.clone()),
                images: SqlxToolImageRepository::boxed(pool.clone()),
                videos: SqlxToolVideoRepository::boxed(pool.clone()),
                features: SqlxFeatureRepository::boxed(pool.clone()),
                reviews: SqlxReviewRepository::boxed(pool.clone()),
            },
            pool,
            Invalidator::new(create_test_cache()),
        )
    }

    pub(crate) async fn seed_category(pool: &DynDatabasePool, slug: &str) -> i64 {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO categories (name, slug, icon, description, created_at, updated_at) VALUES (?, ?, '', '', ?, ?)",
        )
        .bind(slug)
        .bind(slug)
        .bind(now)
        .bind(now)
        .execute(pool.as_sqlite().unwrap())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    pub(crate) fn tool_input(name: &str, category_id: i64) -> AiToolInput {
        AiToolInput {
            name: name.to_string(),
            short_description: format!("{} in one line", name),
            long_description: format!("{} in many lines", name),
            website_url: "https://example.com".to_string(),
            pricing_type: "freemium".to_string(),
            categories: vec![category_id],
            ..Default::default()
        }
    }

    async fn setup() -> (DynDatabasePool, AiToolService, i64) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let category = seed_category(&pool, "writing").await;
        (pool.clone(), tool_service(pool), category)
    }

    fn errors_of(err: ServiceError) -> crate::models::FieldErrors {
        match err {
            ServiceError::Validation(errors) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_returns_full_representation() {
        let (_pool, svc, category) = setup().await;
        let detail = svc.create(tool_input("Chat Helper", category)).await.unwrap();

        assert_eq!(detail.tool.slug, "chat-helper");
        assert_eq!(detail.categories, vec![category]);
        assert!(detail.features.is_empty());
        assert!(detail.reviews.is_empty());
        assert_eq!(detail.tool.views, 0);
    }

    #[tokio::test]
    async fn test_validation_collects_every_problem() {
        let (_pool, svc, _) = setup().await;
        let input = AiToolInput {
            website_url: "not a url".to_string(),
            pricing_type: "donationware".to_string(),
            categories: vec![404],
            pricing_plans: vec![7],
            ..Default::default()
        };
        let errors = errors_of(svc.create(input).await.unwrap_err());

        for field in [
            "name",
            "short_description",
            "long_description",
            "website_url",
            "pricing_type",
            "categories",
            "pricing_plans",
        ] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
        assert_eq!(
            errors.get("pricing_type").unwrap(),
            ["\"donationware\" is not a valid choice."]
        );
        assert_eq!(
            errors.get("categories").unwrap(),
            ["Invalid pk \"404\" - object does not exist."]
        );
    }

    #[tokio::test]
    async fn test_categories_required() {
        let (_pool, svc, category) = setup().await;
        let mut input = tool_input("Lonely", category);
        input.categories.clear();
        let errors = errors_of(svc.create(input).await.unwrap_err());
        assert_eq!(errors.get("categories").unwrap(), ["This list may not be empty."]);
    }

    #[tokio::test]
    async fn test_views_cannot_be_written_and_count_up() {
        let (_pool, svc, category) = setup().await;
        let created = svc.create(tool_input("Viewed", category)).await.unwrap();

        assert_eq!(svc.record_view(created.tool.id).await.unwrap(), 1);
        assert_eq!(svc.record_view(created.tool.id).await.unwrap(), 2);

        let updated = svc
            .update(created.tool.id, tool_input("Viewed", category))
            .await
            .unwrap();
        assert_eq!(updated.tool.views, 2);
        assert!(matches!(svc.record_view(999).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_embeds_relations_per_tool() {
        let (_pool, svc, category) = setup().await;
        let a = svc.create(tool_input("Alpha", category)).await.unwrap();
        let b = svc.create(tool_input("Beta", category)).await.unwrap();
        svc.replace_inlines(
            a.tool.id,
            ToolChildren {
                features: Some(vec![FeatureInput {
                    name: "Fast".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let page = svc.list(&ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
        let by_id: HashMap<i64, &AiToolDetail> =
            page.results.iter().map(|d| (d.tool.id, d)).collect();
        assert_eq!(by_id[&a.tool.id].features.len(), 1);
        assert!(by_id[&b.tool.id].features.is_empty());
    }

    #[tokio::test]
    async fn test_inline_errors_are_indexed() {
        let (_pool, svc, category) = setup().await;
        let created = svc.create(tool_input("Gallery", category)).await.unwrap();

        let errors = errors_of(
            svc.replace_inlines(
                created.tool.id,
                ToolChildren {
                    images: Some(vec![
                        ToolImageInput {
                            image: "tool_images/ok.png".to_string(),
                            ..Default::default()
                        },
                        ToolImageInput::default(),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err(),
        );
        assert!(errors.contains("images.1.image"));
        assert!(!errors.contains("images.0.image"));
    }

    #[tokio::test]
    async fn test_search_and_filter() {
        let (pool, svc, category) = setup().await;
        let other = seed_category(&pool, "audio").await;
        let mut free = tool_input("Transcriber", other);
        free.pricing_type = "free".to_string();
        svc.create(free).await.unwrap();
        svc.create(tool_input("Copywriter", category)).await.unwrap();

        let params = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };

        let query = ListQuery::from_params(&params(&[("search", "TRANSCRI")])).unwrap();
        let page = svc.list(&query).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].tool.name, "Transcriber");

        let query = ListQuery::from_params(&params(&[("categories", &category.to_string())])).unwrap();
        let page = svc.list(&query).await.unwrap();
        assert_eq!(page.results[0].tool.name, "Copywriter");
        assert_eq!(page.total, 1);

        let query = ListQuery::from_params(&params(&[("pricing_type", "lifetime")])).unwrap();
        let errors = errors_of(svc.list(&query).await.unwrap_err());
        assert!(errors.contains("pricing_type"));
    }
}
