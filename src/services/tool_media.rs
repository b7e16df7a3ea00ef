//! Services for the rows a tool owns: images, videos and features
//!
//! Each row must point at an existing tool. Changing one changes the
//! owning tool's representation, so writes invalidate the tool cache.

use async_trait::async_trait;
use std::sync::Arc;

use super::resource::{Invalidator, Resource};
use super::validation::Validator;
use super::ServiceError;
use crate::db::repositories::{FeatureRepository, ToolImageRepository, ToolVideoRepository};
use crate::db::{DynDatabasePool, FilterField, FilterKind, ListQuery, ListSpec, Page};
use crate::models::{Feature, FeatureInput, ToolImage, ToolImageInput, ToolVideo, ToolVideoInput};

const TOOL_CACHE_PREFIX: &str = "ai_tool";

const TOOL_FILTER: FilterField = FilterField {
    param: "tool",
    kind: FilterKind::Int("tool_id"),
};

pub static TOOL_IMAGE_LIST: ListSpec = ListSpec {
    table: "tool_images",
    search: &["caption"],
    filters: &[
        TOOL_FILTER,
        FilterField {
            param: "is_featured",
            kind: FilterKind::Bool("is_featured"),
        },
    ],
    ordering: &["id", "is_featured"],
    default_order: "id ASC",
};

pub static TOOL_VIDEO_LIST: ListSpec = ListSpec {
    table: "tool_videos",
    search: &["caption", "video_url"],
    filters: &[
        TOOL_FILTER,
        FilterField {
            param: "is_featured",
            kind: FilterKind::Bool("is_featured"),
        },
    ],
    ordering: &["id", "is_featured"],
    default_order: "id ASC",
};

pub static FEATURE_LIST: ListSpec = ListSpec {
    table: "features",
    search: &["name", "description"],
    filters: &[TOOL_FILTER],
    ordering: &["id", "name"],
    default_order: "id ASC",
};

/// Owning tool must be given and must exist
async fn check_tool(
    v: &mut Validator,
    pool: &DynDatabasePool,
    tool_id: Option<i64>,
) -> Result<(), ServiceError> {
    v.required_id("tool", tool_id);
    v.exists_opt(pool, "tool", "ai_tools", tool_id).await?;
    Ok(())
}

pub struct ToolImageService {
    repo: Arc<dyn ToolImageRepository>,
    pool: DynDatabasePool,
    invalidator: Invalidator,
}

impl ToolImageService {
    pub fn new(
        repo: Arc<dyn ToolImageRepository>,
        pool: DynDatabasePool,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            repo,
            pool,
            invalidator,
        }
    }

    async fn validate(&self, input: &ToolImageInput) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("image", &input.image, 255)
            .max_chars("caption", &input.caption, 200);
        check_tool(&mut v, &self.pool, input.tool_id).await?;
        v.finish()
    }
}

#[async_trait]
impl Resource for ToolImageService {
    type Repr = ToolImage;
    type Input = ToolImageInput;

    fn name(&self) -> &'static str {
        "tool-images"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &TOOL_IMAGE_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<ToolImage>, ServiceError> {
        let sql = query.compile(&TOOL_IMAGE_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<ToolImage, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool image"))
    }

    async fn create(&self, input: ToolImageInput) -> Result<ToolImage, ServiceError> {
        self.validate(&input).await?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, input: ToolImageInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.validate(&input).await
    }

    async fn update(&self, id: i64, input: ToolImageInput) -> Result<ToolImage, ServiceError> {
        self.get(id).await?;
        self.validate(&input).await?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool image"))?;
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Tool image"));
        }
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, image: &ToolImage) -> ToolImageInput {
        ToolImageInput::from(image)
    }
}

pub struct ToolVideoService {
    repo: Arc<dyn ToolVideoRepository>,
    pool: DynDatabasePool,
    invalidator: Invalidator,
}

impl ToolVideoService {
    pub fn new(
        repo: Arc<dyn ToolVideoRepository>,
        pool: DynDatabasePool,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            repo,
            pool,
            invalidator,
        }
    }

    async fn validate(&self, input: &ToolVideoInput) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.url("video_url", &input.video_url, 200)
            .max_chars("caption", &input.caption, 200);
        check_tool(&mut v, &self.pool, input.tool_id).await?;
        v.finish()
    }
}

#[async_trait]
impl Resource for ToolVideoService {
    type Repr = ToolVideo;
    type Input = ToolVideoInput;

    fn name(&self) -> &'static str {
        "tool-videos"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &TOOL_VIDEO_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<ToolVideo>, ServiceError> {
        let sql = query.compile(&TOOL_VIDEO_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<ToolVideo, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool video"))
    }

    async fn create(&self, input: ToolVideoInput) -> Result<ToolVideo, ServiceError> {
        self.validate(&input).await?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, input: ToolVideoInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.validate(&input).await
    }

    async fn update(&self, id: i64, input: ToolVideoInput) -> Result<ToolVideo, ServiceError> {
        self.get(id).await?;
        self.validate(&input).await?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool video"))?;
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Tool video"));
        }
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, video: &ToolVideo) -> ToolVideoInput {
        ToolVideoInput::from(video)
    }
}

pub struct FeatureService {
    repo: Arc<dyn FeatureRepository>,
    pool: DynDatabasePool,
    invalidator: Invalidator,
}

impl FeatureService {
    pub fn new(
        repo: Arc<dyn FeatureRepository>,
        pool: DynDatabasePool,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            repo,
            pool,
            invalidator,
        }
    }

    async fn validate(&self, input: &FeatureInput) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("name", &input.name, 200)
            .max_chars("icon", &input.icon, 50);
        check_tool(&mut v, &self.pool, input.tool_id).await?;
        v.finish()
    }
}

#[async_trait]
impl Resource for FeatureService {
    type Repr = Feature;
    type Input = FeatureInput;

    fn name(&self) -> &'static str {
        "features"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &FEATURE_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<Feature>, ServiceError> {
        let sql = query.compile(&FEATURE_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<Feature, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Feature"))
    }

    async fn create(&self, input: FeatureInput) -> Result<Feature, ServiceError> {
        self.validate(&input).await?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, input: FeatureInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.validate(&input).await
    }

    async fn update(&self, id: i64, input: FeatureInput) -> Result<Feature, ServiceError> {
        self.get(id).await?;
        self.validate(&input).await?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Feature"))?;
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Feature"));
        }
        self.invalidator.invalidate(TOOL_CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, feature: &Feature) -> FeatureInput {
        FeatureInput::from(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::{
        SqlxFeatureRepository, SqlxToolImageRepository, SqlxToolVideoRepository,
    };
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::services::ai_tool::tests::{seed_category, tool_input, tool_service};
    use std::collections::HashMap;

    async fn setup() -> (DynDatabasePool, i64) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let category = seed_category(&pool, "design").await;
        let tool = tool_service(pool.clone())
            .create(tool_input("Painter", category))
            .await
            .unwrap();
        (pool, tool.tool.id)
    }

    fn invalidator() -> Invalidator {
        Invalidator::new(create_test_cache())
    }

    #[tokio::test]
    async fn test_tool_is_required_and_must_exist() {
        let (pool, _) = setup().await;
        let svc = ToolImageService::new(
            SqlxToolImageRepository::boxed(pool.clone()),
            pool,
            invalidator(),
        );

        let missing = svc
            .create(ToolImageInput {
                image: "tool_images/a.png".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(missing, ServiceError::Validation(ref e)
            if e.get("tool").unwrap() == ["This field is required."]));

        let unknown = svc
            .create(ToolImageInput {
                tool_id: Some(404),
                image: "tool_images/a.png".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown, ServiceError::Validation(ref e)
            if e.get("tool").unwrap() == ["Invalid pk \"404\" - object does not exist."]));
    }

    #[tokio::test]
    async fn test_video_url_validated() {
        let (pool, tool) = setup().await;
        let svc = ToolVideoService::new(
            SqlxToolVideoRepository::boxed(pool.clone()),
            pool,
            invalidator(),
        );

        let err = svc
            .create(ToolVideoInput {
                tool_id: Some(tool),
                video_url: "youtube".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("video_url")));

        let video = svc
            .create(ToolVideoInput {
                tool_id: Some(tool),
                video_url: "https://youtube.com/watch?v=abc".to_string(),
                is_featured: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(video.tool_id, tool);
    }

    #[tokio::test]
    async fn test_features_filtered_by_tool() {
        let (pool, tool) = setup().await;
        let svc = FeatureService::new(
            SqlxFeatureRepository::boxed(pool.clone()),
            pool.clone(),
            invalidator(),
        );
        for name in ["Fast", "Cheap"] {
            svc.create(FeatureInput {
                tool_id: Some(tool),
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        }

        let params: HashMap<String, String> =
            [("tool".to_string(), tool.to_string())].into_iter().collect();
        let page = svc.list(&ListQuery::from_params(&params).unwrap()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.results[0].name, "Fast");

        let params: HashMap<String, String> =
            [("tool".to_string(), "999".to_string())].into_iter().collect();
        let page = svc.list(&ListQuery::from_params(&params).unwrap()).await.unwrap();
        assert_eq!(page.total, 0);
    }
}
