//! Article service
//!
//! Blog articles with category and related-tool links. Views are counted
//! through [`ArticleService::record_view`] and never written by clients.

use async_trait::async_trait;
use std::sync::Arc;

use super::resource::{Invalidator, Resource};
use super::slug::resolve_slug;
use super::validation::Validator;
use super::ServiceError;
use crate::db::repositories::ArticleRepository;
use crate::db::{DynDatabasePool, FilterField, FilterKind, ListQuery, ListSpec, Page};
use crate::models::{Article, ArticleDetail, ArticleInput};

const CACHE_PREFIX: &str = "article";

pub static ARTICLE_LIST: ListSpec = ListSpec {
    table: "articles",
    search: &["title", "content", "excerpt"],
    filters: &[
        FilterField {
            param: "is_published",
            kind: FilterKind::Bool("is_published"),
        },
        FilterField {
            param: "categories",
            kind: FilterKind::Related {
                join_table: "article_categories",
                owner_column: "article_id",
                target_column: "category_id",
            },
        },
        FilterField {
            param: "created_at",
            kind: FilterKind::Date("created_at"),
        },
    ],
    ordering: &["title", "created_at", "views"],
    default_order: "created_at DESC",
};

pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    pool: DynDatabasePool,
    invalidator: Invalidator,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticleRepository>, pool: DynDatabasePool, invalidator: Invalidator) -> Self {
        Self {
            repo,
            pool,
            invalidator,
        }
    }

    async fn details(&self, articles: Vec<Article>) -> Result<Vec<ArticleDetail>, ServiceError> {
        let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        let mut categories = self.repo.category_ids(&ids).await?;
        let mut related = self.repo.related_tool_ids(&ids).await?;

        Ok(articles
            .into_iter()
            .map(|article| {
                let id = article.id;
                ArticleDetail {
                    article,
                    categories: categories.remove(&id).unwrap_or_default(),
                    related_tools: related.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    /// Newest published articles for the homepage
    pub async fn latest_published(&self, limit: i64) -> Result<Vec<Article>, ServiceError> {
        Ok(self.repo.latest_published(limit).await?)
    }

    /// Count one view and return the new total
    pub async fn record_view(&self, id: i64) -> Result<i64, ServiceError> {
        let views = self
            .repo
            .increment_views(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Article"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(views)
    }

    async fn validate(&self, input: &mut ArticleInput, id: Option<i64>) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("title", &input.title, 200)
            .required_text("content", &input.content)
            .max_chars(
                "featured_image",
                input.featured_image.as_deref().unwrap_or(""),
                255,
            );
        v.exists(&self.pool, "categories", "categories", &input.categories)
            .await?;
        v.exists(&self.pool, "related_tools", "ai_tools", &input.related_tools)
            .await?;
        v.exists_opt(&self.pool, "author", "users", input.author_id)
            .await?;

        let repo = &self.repo;
        input.slug = resolve_slug(
            &mut v,
            &input.slug,
            &input.title,
            200,
            "article with this slug already exists.",
            |candidate| async move { repo.slug_taken(&candidate, id).await },
        )
        .await?;

        v.finish()
    }
}

#[async_trait]
impl Resource for ArticleService {
    type Repr = ArticleDetail;
    type Input = ArticleInput;

    fn name(&self) -> &'static str {
        "articles"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &ARTICLE_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<ArticleDetail>, ServiceError> {
        let sql = query.compile(&ARTICLE_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        let details = self.details(items).await?;
        Ok(Page::new(details, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<ArticleDetail, ServiceError> {
        let article = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Article"))?;
        self.details(vec![article])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found("Article"))
    }

    async fn create(&self, mut input: ArticleInput) -> Result<ArticleDetail, ServiceError> {
        self.validate(&mut input, None).await?;
        let created = self.repo.create(&input).await?;
        tracing::info!("Created article {} ({})", created.title, created.id);
        self.invalidator.invalidate(CACHE_PREFIX).await;
        self.get(created.id).await
    }

    async fn check_update(&self, id: i64, mut input: ArticleInput) -> Result<(), ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Article"))?;
        self.validate(&mut input, Some(id)).await
    }

    async fn update(&self, id: i64, mut input: ArticleInput) -> Result<ArticleDetail, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Article"))?;
        self.validate(&mut input, Some(id)).await?;
        self.repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Article"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Article"));
        }
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, detail: &ArticleDetail) -> ArticleInput {
        ArticleInput::from(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::SqlxArticleRepository;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::services::ai_tool::tests::seed_category;
    use std::collections::HashMap;

    async fn setup() -> (DynDatabasePool, ArticleService) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let svc = ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            pool.clone(),
            Invalidator::new(create_test_cache()),
        );
        (pool, svc)
    }

    fn input(title: &str) -> ArticleInput {
        ArticleInput {
            title: title.to_string(),
            content: "Body".to_string(),
            is_published: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_categories() {
        let (pool, svc) = setup().await;
        let news = seed_category(&pool, "news").await;
        let mut with_category = input("Top 10 Writers");
        with_category.categories = vec![news, news];
        let created = svc.create(with_category).await.unwrap();

        assert_eq!(created.article.slug, "top-10-writers");
        assert_eq!(created.categories, vec![news]);
        assert!(created.related_tools.is_empty());
        assert_eq!(created.article.views, 0);
    }

    #[tokio::test]
    async fn test_unknown_related_tool_rejected() {
        let (_pool, svc) = setup().await;
        let mut bad = input("Roundup");
        bad.related_tools = vec![42];
        let err = svc.create(bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("related_tools")));
    }

    #[tokio::test]
    async fn test_punctuation_title_needs_explicit_slug() {
        let (_pool, svc) = setup().await;
        let err = svc.create(input("???")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("slug")));

        let mut explicit = input("???");
        explicit.slug = "faq".to_string();
        assert_eq!(svc.create(explicit).await.unwrap().article.slug, "faq");
    }

    #[tokio::test]
    async fn test_views_and_category_filter() {
        let (pool, svc) = setup().await;
        let guides = seed_category(&pool, "guides").await;
        let mut guide = input("Prompting");
        guide.categories = vec![guides];
        let guide = svc.create(guide).await.unwrap();
        svc.create(input("Unrelated")).await.unwrap();

        assert_eq!(svc.record_view(guide.article.id).await.unwrap(), 1);

        let params: HashMap<String, String> =
            [("categories".to_string(), guides.to_string())].into_iter().collect();
        let page = svc.list(&ListQuery::from_params(&params).unwrap()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.results[0].article.views, 1);
        assert_eq!(svc.latest_published(3).await.unwrap().len(), 2);
    }
}
