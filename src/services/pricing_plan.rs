//! Pricing plan service

use async_trait::async_trait;
use std::sync::Arc;

use super::resource::{Invalidator, Resource};
use super::validation::Validator;
use super::ServiceError;
use crate::db::repositories::PricingPlanRepository;
use crate::db::{FilterField, FilterKind, ListQuery, ListSpec, Page};
use crate::models::{PricingPlan, PricingPlanInput};

const CACHE_PREFIX: &str = "pricing_plan";

pub static PRICING_PLAN_LIST: ListSpec = ListSpec {
    table: "pricing_plans",
    search: &["name", "description"],
    filters: &[FilterField {
        param: "is_free",
        kind: FilterKind::Bool("is_free"),
    }],
    ordering: &["name", "price"],
    default_order: "name ASC",
};

pub struct PricingPlanService {
    repo: Arc<dyn PricingPlanRepository>,
    invalidator: Invalidator,
}

impl PricingPlanService {
    pub fn new(repo: Arc<dyn PricingPlanRepository>, invalidator: Invalidator) -> Self {
        Self { repo, invalidator }
    }

    fn validate(input: &PricingPlanInput) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("name", &input.name, 100)
            .decimal("price", input.price, 10, 2);
        v.finish()
    }
}

#[async_trait]
impl Resource for PricingPlanService {
    type Repr = PricingPlan;
    type Input = PricingPlanInput;

    fn name(&self) -> &'static str {
        "pricing-plans"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &PRICING_PLAN_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<PricingPlan>, ServiceError> {
        let sql = query.compile(&PRICING_PLAN_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<PricingPlan, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Pricing plan"))
    }

    async fn create(&self, input: PricingPlanInput) -> Result<PricingPlan, ServiceError> {
        Self::validate(&input)?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, input: PricingPlanInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        Self::validate(&input)
    }

    async fn update(&self, id: i64, input: PricingPlanInput) -> Result<PricingPlan, ServiceError> {
        self.get(id).await?;
        Self::validate(&input)?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Pricing plan"))?;
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Pricing plan"));
        }
        self.invalidator.invalidate(CACHE_PREFIX).await;
        Ok(())
    }

    fn input_from(&self, plan: &PricingPlan) -> PricingPlanInput {
        PricingPlanInput::from(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::SqlxPricingPlanRepository;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use std::collections::HashMap;

    async fn service() -> PricingPlanService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        PricingPlanService::new(
            SqlxPricingPlanRepository::boxed(pool),
            Invalidator::new(create_test_cache()),
        )
    }

    #[tokio::test]
    async fn test_price_precision_validated() {
        let svc = service().await;
        let err = svc
            .create(PricingPlanInput {
                name: "Pro".to_string(),
                price: Some(9.999),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("price")));
    }

    #[tokio::test]
    async fn test_filter_free_plans() {
        let svc = service().await;
        for (name, free) in [("Free", true), ("Team", false), ("Hobby", true)] {
            svc.create(PricingPlanInput {
                name: name.to_string(),
                is_free: free,
                price: if free { Some(0.0) } else { Some(30.0) },
                ..Default::default()
            })
            .await
            .unwrap();
        }

        let params: HashMap<String, String> =
            [("is_free".to_string(), "true".to_string())].into_iter().collect();
        let query = ListQuery::from_params(&params).unwrap();
        let page = svc.list(&query).await.unwrap();
        let names: Vec<String> = page.results.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Free", "Hobby"]);
        assert_eq!(page.total, 2);
    }
}
