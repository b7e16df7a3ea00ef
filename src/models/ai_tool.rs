//! AI tool model
//!
//! - `AiTool` is the stored row
//! - `AiToolDetail` is the API representation, with relation ids and the
//!   owned media, feature and review rows embedded
//! - `AiToolInput` carries the writable fields

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Feature, Review, ToolImage, ToolVideo};

/// A cataloged AI product or service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiTool {
    pub id: i64,
    pub name: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    pub short_description: String,
    pub long_description: String,
    pub website_url: String,
    /// Uploaded logo, stored as a path under the media root
    pub logo: Option<String>,
    /// Externally hosted logo
    pub logo_url: Option<String>,
    /// Promoted on the homepage
    pub featured: bool,
    #[sqlx(try_from = "String")]
    pub pricing_type: PricingType,
    pub launch_date: Option<NaiveDate>,
    pub created_by: Option<i64>,
    pub is_verified: bool,
    /// Page views; only ever incremented
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Monetization model of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    Free,
    Paid,
    Freemium,
    Subscription,
    OneTime,
}

/// Accepted `pricing_type` values, in display order
pub const PRICING_TYPES: &[&str] = &["free", "paid", "freemium", "subscription", "one_time"];

impl PricingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::Free => "free",
            PricingType::Paid => "paid",
            PricingType::Freemium => "freemium",
            PricingType::Subscription => "subscription",
            PricingType::OneTime => "one_time",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            PricingType::Free => "Free",
            PricingType::Paid => "Paid",
            PricingType::Freemium => "Freemium",
            PricingType::Subscription => "Subscription",
            PricingType::OneTime => "One-time Purchase",
        }
    }
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidPricingType(pub String);

impl FromStr for PricingType {
    type Err = InvalidPricingType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PricingType::Free),
            "paid" => Ok(PricingType::Paid),
            "freemium" => Ok(PricingType::Freemium),
            "subscription" => Ok(PricingType::Subscription),
            "one_time" => Ok(PricingType::OneTime),
            _ => Err(InvalidPricingType(s.to_string())),
        }
    }
}

impl TryFrom<String> for PricingType {
    type Error = InvalidPricingType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Full tool representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiToolDetail {
    #[serde(flatten)]
    pub tool: AiTool,
    /// Category ids
    pub categories: Vec<i64>,
    /// Pricing plan ids
    pub pricing_plans: Vec<i64>,
    pub features: Vec<Feature>,
    pub images: Vec<ToolImage>,
    pub videos: Vec<ToolVideo>,
    pub reviews: Vec<Review>,
}

/// Writable tool fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiToolInput {
    pub name: String,
    /// Derived from `name` when blank
    pub slug: String,
    pub short_description: String,
    pub long_description: String,
    pub website_url: String,
    pub logo: Option<String>,
    pub logo_url: Option<String>,
    pub featured: bool,
    /// Validated against [`PRICING_TYPES`]
    pub pricing_type: String,
    pub categories: Vec<i64>,
    pub pricing_plans: Vec<i64>,
    pub launch_date: Option<NaiveDate>,
    pub created_by: Option<i64>,
    pub is_verified: bool,
}

impl From<&AiToolDetail> for AiToolInput {
    fn from(detail: &AiToolDetail) -> Self {
        let tool = &detail.tool;
        Self {
            name: tool.name.clone(),
            slug: tool.slug.clone(),
            short_description: tool.short_description.clone(),
            long_description: tool.long_description.clone(),
            website_url: tool.website_url.clone(),
            logo: tool.logo.clone(),
            logo_url: tool.logo_url.clone(),
            featured: tool.featured,
            pricing_type: tool.pricing_type.as_str().to_string(),
            categories: detail.categories.clone(),
            pricing_plans: detail.pricing_plans.clone(),
            launch_date: tool.launch_date,
            created_by: tool.created_by,
            is_verified: tool.is_verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_type_round_trip() {
        for value in PRICING_TYPES {
            let parsed: PricingType = value.parse().unwrap();
            assert_eq!(parsed.as_str(), *value);
            assert_eq!(serde_json::to_value(parsed).unwrap(), *value);
        }
        assert!("lifetime".parse::<PricingType>().is_err());
        assert_eq!(PricingType::OneTime.label(), "One-time Purchase");
    }

    #[test]
    fn test_detail_flattens_tool_fields() {
        let now = Utc::now();
        let detail = AiToolDetail {
            tool: AiTool {
                id: 1,
                name: "Writer".to_string(),
                slug: "writer".to_string(),
                short_description: "Writes".to_string(),
                long_description: "Writes a lot".to_string(),
                website_url: "https://writer.example.com".to_string(),
                logo: None,
                logo_url: None,
                featured: true,
                pricing_type: PricingType::Freemium,
                launch_date: NaiveDate::from_ymd_opt(2023, 5, 1),
                created_by: None,
                is_verified: false,
                views: 12,
                created_at: now,
                updated_at: now,
            },
            categories: vec![2, 3],
            pricing_plans: vec![],
            features: vec![],
            images: vec![],
            videos: vec![],
            reviews: vec![],
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Writer");
        assert_eq!(json["pricing_type"], "freemium");
        assert_eq!(json["launch_date"], "2023-05-01");
        assert_eq!(json["categories"], serde_json::json!([2, 3]));

        let input = AiToolInput::from(&detail);
        assert_eq!(input.pricing_type, "freemium");
        assert_eq!(input.categories, vec![2, 3]);
    }
}
