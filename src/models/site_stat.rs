//! Site statistic model

use serde::{Deserialize, Serialize};

/// Free-form figure shown in the homepage stats strip, e.g. "Tools listed: 500+"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SiteStat {
    pub id: i64,
    /// Label (unique)
    pub stat_name: String,
    pub stat_value: String,
    /// Font Awesome icon class
    pub icon: String,
    pub is_active: bool,
}

/// Writable site stat fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteStatInput {
    pub stat_name: String,
    pub stat_value: String,
    pub icon: String,
    pub is_active: bool,
}

impl Default for SiteStatInput {
    fn default() -> Self {
        Self {
            stat_name: String::new(),
            stat_value: String::new(),
            icon: String::new(),
            is_active: true,
        }
    }
}

impl From<&SiteStat> for SiteStatInput {
    fn from(stat: &SiteStat) -> Self {
        Self {
            stat_name: stat.stat_name.clone(),
            stat_value: stat.stat_value.clone(),
            icon: stat.icon.clone(),
            is_active: stat.is_active,
        }
    }
}
