//! Comparison service
//!
//! A comparison's representation embeds the full representation of every
//! compared tool, so it borrows the tool service to build them.

use async_trait::async_trait;
use std::sync::Arc;

use super::ai_tool::AiToolService;
use super::resource::{Invalidator, Resource};
use super::slug::resolve_slug;
use super::validation::Validator;
use super::ServiceError;
use crate::db::repositories::ComparisonRepository;
use crate::db::{DynDatabasePool, FilterField, FilterKind, ListQuery, ListSpec, Page};
use crate::models::{Comparison, ComparisonDetail, ComparisonInput};

const CACHE_PREFIX: &str = "comparison";

pub static COMPARISON_LIST: ListSpec = ListSpec {
    table: "comparisons",
    search: &["title", "content"],
    filters: &[
        FilterField {
            param: "is_published",
            kind: FilterKind::Bool("is_published"),
        },
        FilterField {
            param: "created_at",
            kind: FilterKind::Date("created_at"),
        },
    ],
    ordering: &["title", "created_at"],
    default_order: "created_at DESC",
};

pub struct ComparisonService {
    repo: Arc<dyn ComparisonRepository>,
    tools: Arc<AiToolService>,
    pool: DynDatabasePool,
    invalidator: Invalidator,
}

impl ComparisonService {
    pub fn new(
        repo: Arc<dyn ComparisonRepository>,
        tools: Arc<AiToolService>,
        pool: DynDatabasePool,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            repo,
            tools,
            pool,
            invalidator,
        }
    }

    async fn details(
        &self,
        comparisons: Vec<Comparison>,
    ) -> Result<Vec<ComparisonDetail>, ServiceError> {
        let ids: Vec<i64> = comparisons.iter().map(|c| c.id).collect();
        let mut links = self.repo.tool_ids(&ids).await?;

        let mut all_tools: Vec<i64> = links.values().flatten().copied().collect();
        all_tools.sort_unstable();
        all_tools.dedup();
        let mut tools = std::collections::HashMap::new();
        for detail in self.tools.details_for(&all_tools).await? {
            tools.insert(detail.tool.id, detail);
        }

        Ok(comparisons
            .into_iter()
            .map(|comparison| {
                let tool_ids = links.remove(&comparison.id).unwrap_or_default();
                ComparisonDetail {
                    comparison,
                    tools: tool_ids
                        .iter()
                        .filter_map(|id| tools.get(id).cloned())
                        .collect(),
                }
            })
            .collect())
    }

    async fn validate(&self, input: &mut ComparisonInput, id: Option<i64>) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("title", &input.title, 200)
            .required_text("content", &input.content)
            .non_empty("tool_ids", &input.tool_ids);
        v.exists(&self.pool, "tool_ids", "ai_tools", &input.tool_ids)
            .await?;
        v.exists_opt(&self.pool, "author", "users", input.author_id)
            .await?;

        let repo = &self.repo;
        input.slug = resolve_slug(
            &mut v,
            &input.slug,
            &input.title,
            200,
            "comparison with this slug already exists.",
            |candidate| async move { repo.slug_taken(&candidate, id).await },
        )
        .await?;

        v.finish()
    }
}

#[async_trait]
impl Resource for ComparisonService {
    type Repr = ComparisonDetail;
    type Input = ComparisonInput;

    fn name(&self) -> &'static str {
        "comparisons"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &COMPARISON_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<ComparisonDetail>, ServiceError> {
        let sql = query.compile(&COMPARISON_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        let details = self.details(items).await?;
        Ok(Page::new(details, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<ComparisonDetail, ServiceError> {
        let comparison = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comparison"))?;
        self.details(vec![comparison])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found("Comparison"))
    }

    async fn create(&self, mut input: ComparisonInput) -> Result<ComparisonDetail, ServiceError> {
        self.validate(&mut input, None).await?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        self.get(created.id).await
    }

    async fn check_update(&self, id: i64, mut input: ComparisonInput) -> Result<(), ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comparison"))?;
        self.validate(&mut input, Some(id)).await
    }

    async fn update(
        &self,
        id: i64,
        mut input: ComparisonInput,
    ) -> Result<ComparisonDetail, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comparison"))?;
        self.validate(&mut input, Some(id)).await?;
        self.repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comparison"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Comparison"));
        }
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, detail: &ComparisonDetail) -> ComparisonInput {
        ComparisonInput::from(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::SqlxComparisonRepository;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::services::ai_tool::tests::{seed_category, tool_input, tool_service};

    async fn setup() -> (ComparisonService, Vec<i64>) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let category = seed_category(&pool, "search").await;
        let tools = Arc::new(tool_service(pool.clone()));
        let mut ids = Vec::new();
        for name in ["Finder", "Seeker"] {
            ids.push(tools.create(tool_input(name, category)).await.unwrap().tool.id);
        }
        let svc = ComparisonService::new(
            SqlxComparisonRepository::boxed(pool.clone()),
            tools,
            pool,
            Invalidator::new(create_test_cache()),
        );
        (svc, ids)
    }

    fn input(title: &str, tool_ids: Vec<i64>) -> ComparisonInput {
        ComparisonInput {
            title: title.to_string(),
            content: "Side by side".to_string(),
            tool_ids,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_tools_embedded_in_representation() {
        let (svc, ids) = setup().await;
        let created = svc.create(input("Finder vs Seeker", ids.clone())).await.unwrap();

        assert_eq!(created.comparison.slug, "finder-vs-seeker");
        let embedded: Vec<i64> = created.tools.iter().map(|t| t.tool.id).collect();
        assert_eq!(embedded, ids);
        assert_eq!(created.tools[0].categories.len(), 1);

        let json = serde_json::to_value(&created).unwrap();
        assert!(json.get("tool_ids").is_none());
        assert_eq!(json["tools"][1]["name"], "Seeker");
    }

    #[tokio::test]
    async fn test_tool_ids_required_and_checked() {
        let (svc, ids) = setup().await;
        let err = svc.create(input("Empty", vec![])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e)
            if e.get("tool_ids").unwrap() == ["This list may not be empty."]));

        let err = svc.create(input("Ghost", vec![ids[0], 999])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e)
            if e.get("tool_ids").unwrap() == ["Invalid pk \"999\" - object does not exist."]));
    }

    #[tokio::test]
    async fn test_update_replaces_tools() {
        let (svc, ids) = setup().await;
        let created = svc.create(input("Versus", ids.clone())).await.unwrap();

        let updated = svc
            .update(created.comparison.id, input("Versus", vec![ids[1]]))
            .await
            .unwrap();
        assert_eq!(updated.tools.len(), 1);
        assert_eq!(updated.tools[0].tool.id, ids[1]);
        assert_eq!(updated.comparison.slug, "versus");
    }
}
