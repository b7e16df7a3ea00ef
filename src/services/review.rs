//! Review service

use async_trait::async_trait;
use std::sync::Arc;

use super::resource::{Invalidator, Resource};
use super::validation::Validator;
use super::ServiceError;
use crate::db::repositories::ReviewRepository;
use crate::db::{DynDatabasePool, FilterField, FilterKind, ListQuery, ListSpec, Page};
use crate::models::{Review, ReviewInput, MAX_RATING, MIN_RATING};

const CACHE_PREFIX: &str = "review";

pub const APPROVE: &str = "approve_reviews";
pub const DISAPPROVE: &str = "disapprove_reviews";

pub static REVIEW_LIST: ListSpec = ListSpec {
    table: "reviews",
    search: &[
        "title",
        "content",
        "(SELECT name FROM ai_tools WHERE ai_tools.id = reviews.tool_id)",
    ],
    filters: &[
        FilterField {
            param: "rating",
            kind: FilterKind::Int("rating"),
        },
        FilterField {
            param: "is_approved",
            kind: FilterKind::Bool("is_approved"),
        },
        FilterField {
            param: "created_at",
            kind: FilterKind::Date("created_at"),
        },
        FilterField {
            param: "tool",
            kind: FilterKind::Int("tool_id"),
        },
    ],
    ordering: &["created_at", "rating"],
    default_order: "created_at DESC",
};

pub struct ReviewService {
    repo: Arc<dyn ReviewRepository>,
    pool: DynDatabasePool,
    invalidator: Invalidator,
}

impl ReviewService {
    pub fn new(repo: Arc<dyn ReviewRepository>, pool: DynDatabasePool, invalidator: Invalidator) -> Self {
        Self {
            repo,
            pool,
            invalidator,
        }
    }

    /// Approve or hide reviews in bulk
    pub async fn set_approved(&self, ids: &[i64], approved: bool) -> Result<u64, ServiceError> {
        let affected = self.repo.set_approved(ids, approved).await?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(affected)
    }

    async fn validate(&self, input: &ReviewInput) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.required_id("tool", input.tool_id)
            .int_range("rating", input.rating, MIN_RATING.into(), MAX_RATING.into())
            .text("title", &input.title, 200)
            .required_text("content", &input.content);
        v.exists_opt(&self.pool, "tool", "ai_tools", input.tool_id)
            .await?;
        v.exists_opt(&self.pool, "user", "users", input.user_id)
            .await?;
        v.finish()
    }
}

#[async_trait]
impl Resource for ReviewService {
    type Repr = Review;
    type Input = ReviewInput;

    fn name(&self) -> &'static str {
        "reviews"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &REVIEW_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<Review>, ServiceError> {
        let sql = query.compile(&REVIEW_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<Review, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review"))
    }

    async fn create(&self, input: ReviewInput) -> Result<Review, ServiceError> {
        self.validate(&input).await?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, input: ReviewInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.validate(&input).await
    }

    async fn update(&self, id: i64, input: ReviewInput) -> Result<Review, ServiceError> {
        self.get(id).await?;
        self.validate(&input).await?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Review"));
        }
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, review: &Review) -> ReviewInput {
        ReviewInput::from(review)
    }

    async fn run_action(&self, action: &str, ids: &[i64]) -> Result<Option<u64>, ServiceError> {
        match action {
            APPROVE => self.set_approved(ids, true).await.map(Some),
            DISAPPROVE => self.set_approved(ids, false).await.map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::SqlxReviewRepository;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::services::ai_tool::tests::{seed_category, tool_input, tool_service};
    use std::collections::HashMap;

    async fn setup() -> (ReviewService, i64) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let category = seed_category(&pool, "chat").await;
        let tool = tool_service(pool.clone())
            .create(tool_input("Talkative", category))
            .await
            .unwrap();
        let svc = ReviewService::new(
            SqlxReviewRepository::boxed(pool.clone()),
            pool,
            Invalidator::new(create_test_cache()),
        );
        (svc, tool.tool.id)
    }

    fn review(tool: i64, rating: i64, title: &str) -> ReviewInput {
        ReviewInput {
            tool_id: Some(tool),
            rating: Some(rating),
            title: title.to_string(),
            content: "Worth it".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_rating_must_be_between_one_and_five() {
        let (svc, tool) = setup().await;
        for rating in [0, 6] {
            let err = svc.create(review(tool, rating, "Meh")).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("rating")));
        }
        let ok = svc.create(review(tool, 5, "Great")).await.unwrap();
        assert_eq!(ok.rating, 5);
        assert!(!ok.is_approved);
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let (svc, tool) = setup().await;
        let mut input = review(tool, 4, "Solid");
        input.user_id = Some(77);
        let err = svc.create(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("user")));
    }

    #[tokio::test]
    async fn test_approve_actions() {
        let (svc, tool) = setup().await;
        let a = svc.create(review(tool, 4, "One")).await.unwrap();
        let b = svc.create(review(tool, 3, "Two")).await.unwrap();

        let affected = svc.run_action(APPROVE, &[a.id, b.id]).await.unwrap();
        assert_eq!(affected, Some(2));
        assert!(svc.get(a.id).await.unwrap().is_approved);

        assert_eq!(svc.run_action(DISAPPROVE, &[b.id]).await.unwrap(), Some(1));
        assert!(!svc.get(b.id).await.unwrap().is_approved);

        assert_eq!(svc.run_action("mark_as_processed", &[a.id]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_search_matches_tool_name() {
        let (svc, tool) = setup().await;
        svc.create(review(tool, 5, "Loved it")).await.unwrap();

        let params: HashMap<String, String> =
            [("search".to_string(), "talkat".to_string())].into_iter().collect();
        let page = svc.list(&ListQuery::from_params(&params).unwrap()).await.unwrap();
        assert_eq!(page.total, 1);

        let params: HashMap<String, String> =
            [("rating".to_string(), "3".to_string())].into_iter().collect();
        let page = svc.list(&ListQuery::from_params(&params).unwrap()).await.unwrap();
        assert_eq!(page.total, 0);
    }
}
