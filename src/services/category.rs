//! Category service
//!
//! Implements business logic for category management:
//! - Create, read, update, delete categories
//! - Name and slug uniqueness validation
//! - Slug generation from name
//! - Cached slug lookups and tool counts for the homepage

use async_trait::async_trait;
use std::sync::Arc;

use super::resource::{Invalidator, Resource};
use super::slug::resolve_slug;
use super::validation::Validator;
use super::ServiceError;
use crate::cache::CacheLayer;
use crate::db::repositories::CategoryRepository;
use crate::db::{ListQuery, ListSpec, Page};
use crate::models::{Category, CategoryInput, CategoryWithCount};

/// Cache key prefix
const CACHE_PREFIX: &str = "category";

pub static CATEGORY_LIST: ListSpec = ListSpec {
    table: "categories",
    search: &["name", "description"],
    filters: &[],
    ordering: &["name", "created_at"],
    default_order: "name ASC",
};

/// Category service for managing tool categories
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    invalidator: Invalidator,
}

impl CategoryService {
    /// Create a new category service
    pub fn new(repo: Arc<dyn CategoryRepository>, invalidator: Invalidator) -> Self {
        Self { repo, invalidator }
    }

    /// Get category by slug, served from cache when possible
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, ServiceError> {
        let cache = self.invalidator.cache();
        let cache_key = format!("{}:slug:{}", CACHE_PREFIX, slug);
        if let Some(category) = cache.get::<Category>(&cache_key).await.ok().flatten() {
            tracing::debug!("Cache hit for {}", cache_key);
            return Ok(Some(category));
        }

        let category = self.repo.get_by_slug(slug).await?;
        if let Some(ref cat) = category {
            if let Err(e) = cache.set(&cache_key, cat, cache.default_ttl()).await {
                tracing::warn!("Failed to cache {}: {}", cache_key, e);
            }
        }
        Ok(category)
    }

    /// All categories with their tool counts, ordered by name
    pub async fn with_tool_counts(&self) -> Result<Vec<CategoryWithCount>, ServiceError> {
        Ok(self.repo.list_with_tool_counts().await?)
    }

    async fn validate(
        &self,
        input: &mut CategoryInput,
        id: Option<i64>,
    ) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("name", &input.name, 100)
            .max_chars("icon", &input.icon, 50);

        if !v.has("name") && self.repo.name_taken(&input.name, id).await? {
            v.add("name", "category with this name already exists.");
        }

        let repo = &self.repo;
        input.slug = resolve_slug(
            &mut v,
            &input.slug,
            &input.name,
            100,
            "category with this slug already exists.",
            |candidate| async move { repo.slug_taken(&candidate, id).await },
        )
        .await?;

        v.finish()
    }
}

#[async_trait]
impl Resource for CategoryService {
    type Repr = Category;
    type Input = CategoryInput;

    fn name(&self) -> &'static str {
        "categories"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &CATEGORY_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<Category>, ServiceError> {
        let sql = query.compile(&CATEGORY_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<Category, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category"))
    }

    async fn create(&self, mut input: CategoryInput) -> Result<Category, ServiceError> {
        self.validate(&mut input, None).await?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, mut input: CategoryInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.validate(&mut input, Some(id)).await
    }

    async fn update(&self, id: i64, mut input: CategoryInput) -> Result<Category, ServiceError> {
        self.get(id).await?;
        self.validate(&mut input, Some(id)).await?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Category"));
        }
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, category: &Category) -> CategoryInput {
        CategoryInput::from(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::SqlxCategoryRepository;
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn service() -> CategoryService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        CategoryService::new(
            SqlxCategoryRepository::boxed(pool),
            Invalidator::new(create_test_cache()),
        )
    }

    fn input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            icon: "fa-robot".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_slug_derived_and_deduplicated() {
        let svc = service().await;
        let first = svc.create(input("Image Generation")).await.unwrap();
        assert_eq!(first.slug, "image-generation");

        let second = svc.create(input("Image Generation!")).await.unwrap();
        assert_eq!(second.slug, "image-generation-2");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let svc = service().await;
        svc.create(input("Writing")).await.unwrap();

        match svc.create(input("Writing")).await {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(
                    errors.get("name").unwrap(),
                    ["category with this name already exists."]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_keeps_own_name_and_rederives_blank_slug() {
        let svc = service().await;
        let created = svc.create(input("Audio")).await.unwrap();

        let mut change = input("Audio Tools");
        change.slug = String::new();
        let updated = svc.update(created.id, change).await.unwrap();
        assert_eq!(updated.slug, "audio-tools");

        let same = svc.update(created.id, input("Audio Tools")).await.unwrap();
        assert_eq!(same.slug, "audio-tools");
    }

    #[tokio::test]
    async fn test_explicit_slug_must_be_valid() {
        let svc = service().await;
        let mut bad = input("Video");
        bad.slug = "video tools".to_string();
        let err = svc.create(bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("slug")));
    }

    #[tokio::test]
    async fn test_slug_lookup_is_cached_and_invalidated() {
        let svc = service().await;
        let created = svc.create(input("Code")).await.unwrap();
        assert_eq!(svc.get_by_slug("code").await.unwrap().unwrap().id, created.id);

        svc.delete(created.id).await.unwrap();
        assert!(svc.get_by_slug("code").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let svc = service().await;
        assert!(matches!(svc.get(99).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(99).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            svc.update(99, input("x")).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
