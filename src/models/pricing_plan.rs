//! Pricing plan model

use serde::{Deserialize, Serialize};

/// A named price point that tools can offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PricingPlan {
    pub id: i64,
    pub name: String,
    /// Price with at most two decimals; `None` for "contact us" style plans
    pub price: Option<f64>,
    pub is_free: bool,
    pub description: String,
}

/// Writable pricing plan fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPlanInput {
    pub name: String,
    pub price: Option<f64>,
    pub is_free: bool,
    pub description: String,
}

impl From<&PricingPlan> for PricingPlanInput {
    fn from(plan: &PricingPlan) -> Self {
        Self {
            name: plan.name.clone(),
            price: plan.price,
            is_free: plan.is_free,
            description: plan.description.clone(),
        }
    }
}
