//! Admin console service
//!
//! Each registered resource gets a [`ModelAdmin`] describing how the
//! console presents it: which columns can be edited from the list, which
//! fields are read-only, the bulk actions on offer and the inline editors.
//! Search, filter and ordering options come from the resource's own list
//! configuration so the console and the public API always agree.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::resource::{DynResource, ResourceRegistry};
use super::ServiceError;
use crate::db::{ListQuery, Page};
use crate::models::FieldErrors;

/// Console lists always show this many rows
pub const ADMIN_PAGE_SIZE: i64 = 20;

/// Action every model supports
pub const DELETE_SELECTED: &str = "delete_selected";

/// Presentation settings for one resource
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelAdmin {
    pub resource: &'static str,
    pub label: &'static str,
    pub list_display: &'static [&'static str],
    /// Columns that `bulk-edit` may change
    pub list_editable: &'static [&'static str],
    pub readonly_fields: &'static [&'static str],
    /// Model-specific actions; `delete_selected` is always added
    pub actions: &'static [&'static str],
    pub inlines: &'static [&'static str],
    /// `(target, source)` pairs, e.g. slug filled from name
    pub prepopulated_fields: &'static [(&'static str, &'static str)],
}

const fn model(resource: &'static str, label: &'static str, list_display: &'static [&'static str]) -> ModelAdmin {
    ModelAdmin {
        resource,
        label,
        list_display,
        list_editable: &[],
        readonly_fields: &[],
        actions: &[],
        inlines: &[],
        prepopulated_fields: &[],
    }
}

/// The console's model registry, in menu order
pub static MODEL_ADMINS: &[ModelAdmin] = &[
    ModelAdmin {
        prepopulated_fields: &[("slug", "name")],
        ..model("categories", "Categories", &["name", "slug", "icon"])
    },
    model("pricing-plans", "Pricing plans", &["name", "price", "is_free"]),
    ModelAdmin {
        readonly_fields: &["views", "created_at", "updated_at"],
        inlines: &["images", "videos", "features", "pricing_plans"],
        prepopulated_fields: &[("slug", "name")],
        ..model(
            "ai-tools",
            "AI tools",
            &["name", "pricing_type", "featured", "is_verified", "views", "created_at"],
        )
    },
    model("tool-images", "Tool images", &["tool", "caption", "is_featured"]),
    model("tool-videos", "Tool videos", &["tool", "video_url", "is_featured"]),
    model("features", "Features", &["tool", "name", "icon"]),
    ModelAdmin {
        list_editable: &["is_approved"],
        actions: &[super::review::APPROVE, super::review::DISAPPROVE],
        ..model("reviews", "Reviews", &["tool", "user", "rating", "is_approved", "created_at"])
    },
    ModelAdmin {
        prepopulated_fields: &[("slug", "title")],
        ..model("comparisons", "Comparisons", &["title", "is_published", "created_at"])
    },
    ModelAdmin {
        readonly_fields: &["views"],
        prepopulated_fields: &[("slug", "title")],
        ..model("articles", "Articles", &["title", "author", "is_published", "views", "created_at"])
    },
    ModelAdmin {
        readonly_fields: &["subscribed_at", "unsubscribe_token"],
        ..model(
            "newsletter-subscribers",
            "Newsletter subscribers",
            &["email", "name", "is_active", "subscribed_at"],
        )
    },
    ModelAdmin {
        actions: &[super::lead::MARK_PROCESSED, super::lead::MARK_UNPROCESSED],
        ..model(
            "contact-submissions",
            "Contact submissions",
            &["name", "email", "subject", "is_processed", "submitted_at"],
        )
    },
    ModelAdmin {
        actions: &[super::lead::MARK_PROCESSED, super::lead::MARK_UNPROCESSED],
        ..model(
            "tool-submissions",
            "Tool submissions",
            &["tool_name", "tool_url", "is_processed", "submitted_at"],
        )
    },
    ModelAdmin {
        list_editable: &["stat_value", "icon", "is_active"],
        ..model("site-stats", "Site stats", &["stat_name", "stat_value", "icon", "is_active"])
    },
];

/// Index entry: configuration plus the current row count
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    #[serde(flatten)]
    pub admin: ModelAdmin,
    pub search_fields: &'static [&'static str],
    pub list_filter: Vec<&'static str>,
    pub ordering: &'static [&'static str],
    pub actions: Vec<&'static str>,
    pub count: i64,
}

/// Result of a bulk action
#[derive(Debug, Serialize, PartialEq)]
pub struct ActionOutcome {
    pub action: String,
    pub affected: u64,
}

pub struct AdminService {
    registry: Arc<ResourceRegistry>,
    models: HashMap<&'static str, ModelAdmin>,
}

impl AdminService {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        let models = MODEL_ADMINS.iter().map(|m| (m.resource, *m)).collect();
        Self { registry, models }
    }

    fn model(&self, name: &str) -> Result<(ModelAdmin, Arc<dyn DynResource>), ServiceError> {
        let admin = self
            .models
            .get(name)
            .copied()
            .ok_or_else(|| ServiceError::not_found("Resource"))?;
        let resource = self
            .registry
            .get(name)
            .ok_or_else(|| ServiceError::not_found("Resource"))?;
        Ok((admin, resource))
    }

    /// The resource behind a console URL
    pub fn resource(&self, name: &str) -> Result<Arc<dyn DynResource>, ServiceError> {
        self.model(name).map(|(_, resource)| resource)
    }

    /// Every registered model with its settings and row count
    pub async fn index(&self) -> Result<Vec<ModelSummary>, ServiceError> {
        let mut summaries = Vec::new();
        for name in self.registry.names() {
            let Ok((admin, resource)) = self.model(name) else {
                continue;
            };
            let spec = resource.list_spec();
            let mut actions = vec![DELETE_SELECTED];
            actions.extend_from_slice(admin.actions);
            summaries.push(ModelSummary {
                admin,
                search_fields: spec.search,
                list_filter: spec.filters.iter().map(|f| f.param).collect(),
                ordering: spec.ordering,
                actions,
                count: resource.count().await?,
            });
        }
        Ok(summaries)
    }

    /// Paginated console list; the page size is fixed
    pub async fn list(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Page<Value>, ServiceError> {
        let (_, resource) = self.model(name)?;
        let query = ListQuery::from_params(params)?.with_page_size(ADMIN_PAGE_SIZE);
        resource.list_json(&query).await
    }

    /// Run `delete_selected` or one of the model's own actions
    pub async fn run_action(
        &self,
        name: &str,
        action: &str,
        ids: &[i64],
    ) -> Result<ActionOutcome, ServiceError> {
        let (admin, resource) = self.model(name)?;

        let affected = if action == DELETE_SELECTED {
            resource.delete_many(ids).await?
        } else if admin.actions.contains(&action) {
            resource
                .run_action(action, ids)
                .await?
                .ok_or_else(|| unknown_action(action))?
        } else {
            return Err(unknown_action(action));
        };

        tracing::info!("Admin action {} on {}: {} rows", action, name, affected);
        Ok(ActionOutcome {
            action: action.to_string(),
            affected,
        })
    }

    /// Apply list-editable changes to several rows.
    ///
    /// Every row is checked before any is written: each needs an integer
    /// `id`, may only carry the model's `list_editable` fields, and must
    /// pass the resource's own validation. Errors are keyed `<row>.<field>`.
    pub async fn bulk_edit(&self, name: &str, rows: Vec<Value>) -> Result<Vec<Value>, ServiceError> {
        let (admin, resource) = self.model(name)?;

        let mut errors = FieldErrors::new();
        let mut changes = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let Value::Object(mut fields) = row else {
                errors.add(format!("{}", i), "Expected an object.");
                continue;
            };
            let id = fields.remove("id").and_then(|v| v.as_i64());
            let Some(id) = id else {
                errors.add(format!("{}.id", i), "This field is required.");
                continue;
            };
            for key in fields.keys() {
                if !admin.list_editable.contains(&key.as_str()) {
                    errors.add(
                        format!("{}.{}", i, key),
                        "This field is not editable from the list.",
                    );
                }
            }
            changes.push((i, id, Value::Object(fields)));
        }
        errors.into_result(())?;

        let mut errors = FieldErrors::new();
        for (i, id, patch) in &changes {
            match resource.check_patch_json(*id, patch.clone()).await {
                Ok(()) => {}
                Err(ServiceError::Validation(field_errors)) => {
                    prefix_errors(&mut errors, *i, &field_errors)
                }
                Err(other) => return Err(other),
            }
        }
        errors.into_result(())?;

        let mut updated = Vec::with_capacity(changes.len());
        for (i, id, patch) in changes {
            let row = resource.patch_json(id, patch).await.map_err(|e| match e {
                ServiceError::Validation(field_errors) => {
                    let mut prefixed = FieldErrors::new();
                    prefix_errors(&mut prefixed, i, &field_errors);
                    ServiceError::Validation(prefixed)
                }
                other => other,
            })?;
            updated.push(row);
        }
        Ok(updated)
    }
}

fn prefix_errors(into: &mut FieldErrors, row: usize, field_errors: &FieldErrors) {
    for field in field_errors.fields() {
        for message in field_errors.get(field).unwrap_or_default() {
            into.add(format!("{}.{}", row, field), message.clone());
        }
    }
}

fn unknown_action(action: &str) -> ServiceError {
    FieldErrors::single("action", format!("Unknown action \"{}\".", action)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::services;
    use serde_json::json;

    #[test]
    fn test_every_model_is_configured_once() {
        let mut seen = std::collections::HashSet::new();
        for model in MODEL_ADMINS {
            assert!(seen.insert(model.resource), "{} listed twice", model.resource);
        }
        assert_eq!(seen.len(), 13);
    }

    #[tokio::test]
    async fn test_index_lists_models_with_counts() {
        let services = services().await;
        let index = services.admin.index().await.unwrap();
        assert_eq!(index.len(), 13);

        let reviews = index.iter().find(|m| m.admin.resource == "reviews").unwrap();
        assert_eq!(reviews.actions, vec![DELETE_SELECTED, "approve_reviews", "disapprove_reviews"]);
        assert_eq!(reviews.list_filter, vec!["rating", "is_approved", "created_at", "tool"]);
        assert_eq!(reviews.count, 0);

        let json = serde_json::to_value(index.iter().find(|m| m.admin.resource == "categories").unwrap()).unwrap();
        assert_eq!(json["prepopulated_fields"], json!([["slug", "name"]]));
    }

    #[tokio::test]
    async fn test_unknown_action_is_validation_error() {
        let services = services().await;
        let err = services
            .admin
            .run_action("categories", "approve_reviews", &[1])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("action")));

        assert!(matches!(
            services.admin.run_action("widgets", DELETE_SELECTED, &[1]).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_selected_skips_missing_rows() {
        let services = services().await;
        let stats = services.admin.resource("site-stats").unwrap();
        let a = stats.create_json(json!({"stat_name": "A", "stat_value": "1"})).await.unwrap();
        let b = stats.create_json(json!({"stat_name": "B", "stat_value": "2"})).await.unwrap();

        let outcome = services
            .admin
            .run_action(
                "site-stats",
                DELETE_SELECTED,
                &[a["id"].as_i64().unwrap(), b["id"].as_i64().unwrap(), 999],
            )
            .await
            .unwrap();
        assert_eq!(outcome.affected, 2);
        assert_eq!(stats.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bulk_edit_limited_to_list_editable() {
        let services = services().await;
        let stats = services.admin.resource("site-stats").unwrap();
        let stat = stats.create_json(json!({"stat_name": "Tools", "stat_value": "10"})).await.unwrap();
        let id = stat["id"].as_i64().unwrap();

        let err = services
            .admin
            .bulk_edit("site-stats", vec![json!({"id": id, "stat_name": "Renamed"})])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("0.stat_name")));

        let updated = services
            .admin
            .bulk_edit(
                "site-stats",
                vec![json!({"id": id, "stat_value": "20", "is_active": false})],
            )
            .await
            .unwrap();
        assert_eq!(updated[0]["stat_value"], "20");
        assert_eq!(updated[0]["stat_name"], "Tools");
        assert_eq!(updated[0]["is_active"], false);

        let err = services
            .admin
            .bulk_edit("site-stats", vec![json!({"id": id, "stat_value": ""})])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("0.stat_value")));
    }

    #[tokio::test]
    async fn test_bulk_edit_writes_nothing_when_a_later_row_fails() {
        let services = services().await;
        let stats = services.admin.resource("site-stats").unwrap();
        let a = stats.create_json(json!({"stat_name": "A", "stat_value": "1"})).await.unwrap();
        let b = stats.create_json(json!({"stat_name": "B", "stat_value": "2"})).await.unwrap();
        let a_id = a["id"].as_i64().unwrap();
        let b_id = b["id"].as_i64().unwrap();

        let err = services
            .admin
            .bulk_edit(
                "site-stats",
                vec![
                    json!({"id": a_id, "stat_value": "99"}),
                    json!({"id": b_id, "stat_value": ""}),
                ],
            )
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(errors) => {
                assert!(errors.contains("1.stat_value"));
                assert!(!errors.contains("0.stat_value"));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(stats.get_json(a_id).await.unwrap()["stat_value"], "1");
        assert_eq!(stats.get_json(b_id).await.unwrap()["stat_value"], "2");
    }

    #[tokio::test]
    async fn test_bulk_edit_missing_row_writes_nothing() {
        let services = services().await;
        let stats = services.admin.resource("site-stats").unwrap();
        let a = stats.create_json(json!({"stat_name": "A", "stat_value": "1"})).await.unwrap();
        let a_id = a["id"].as_i64().unwrap();

        let err = services
            .admin
            .bulk_edit(
                "site-stats",
                vec![
                    json!({"id": a_id, "stat_value": "99"}),
                    json!({"id": 9999, "stat_value": "5"}),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(stats.get_json(a_id).await.unwrap()["stat_value"], "1");
    }

    #[tokio::test]
    async fn test_admin_list_page_size_is_fixed() {
        let services = services().await;
        let stats = services.admin.resource("site-stats").unwrap();
        for i in 0..25 {
            stats
                .create_json(json!({"stat_name": format!("Stat {}", i), "stat_value": "1"}))
                .await
                .unwrap();
        }
        let params: HashMap<String, String> = [("page_size".to_string(), "100".to_string())]
            .into_iter()
            .collect();
        let page = services.admin.list("site-stats", &params).await.unwrap();
        assert_eq!(page.results.len(), 20);
        assert_eq!(page.total_pages, 2);
    }
}
