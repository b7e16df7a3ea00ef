//! Generic resource layer
//!
//! Every entity service implements the typed [`Resource`] trait. The
//! blanket [`DynResource`] impl turns that into a JSON-in, JSON-out
//! interface so the HTTP layer can route `/api/{resource}` through one set
//! of handlers, looked up by name in a [`ResourceRegistry`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::ServiceError;
use crate::cache::{Cache, CacheLayer};
use crate::db::{ListQuery, ListSpec, Page};
use crate::models::{FieldErrors, NON_FIELD_ERRORS};

/// Typed CRUD over one entity
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Full read representation
    type Repr: Serialize + Send + Sync;
    /// Writable fields
    type Input: Serialize + DeserializeOwned + Send + Sync;

    /// URL segment, e.g. `ai-tools`
    fn name(&self) -> &'static str;

    /// Search, filter and ordering configuration
    fn list_spec(&self) -> &'static ListSpec;

    async fn list(&self, query: &ListQuery) -> Result<Page<Self::Repr>, ServiceError>;

    async fn get(&self, id: i64) -> Result<Self::Repr, ServiceError>;

    async fn create(&self, input: Self::Input) -> Result<Self::Repr, ServiceError>;

    /// Run every check `update` would, without writing
    async fn check_update(&self, id: i64, input: Self::Input) -> Result<(), ServiceError>;

    async fn update(&self, id: i64, input: Self::Input) -> Result<Self::Repr, ServiceError>;

    async fn delete(&self, id: i64) -> Result<(), ServiceError>;

    /// The writable view of an existing row, used as the base for PATCH
    fn input_from(&self, repr: &Self::Repr) -> Self::Input;

    /// Delete every listed row that exists; returns how many went
    async fn delete_many(&self, ids: &[i64]) -> Result<u64, ServiceError> {
        let mut deleted = 0;
        for id in ids {
            match self.delete(*id).await {
                Ok(()) => deleted += 1,
                Err(ServiceError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(deleted)
    }

    /// Model-specific bulk action; `None` when the action is unknown
    async fn run_action(&self, _action: &str, _ids: &[i64]) -> Result<Option<u64>, ServiceError> {
        Ok(None)
    }
}

/// Object-safe, JSON-typed view of a [`Resource`]
#[async_trait]
pub trait DynResource: Send + Sync {
    fn name(&self) -> &'static str;

    fn list_spec(&self) -> &'static ListSpec;

    async fn list_json(&self, query: &ListQuery) -> Result<Page<Value>, ServiceError>;

    async fn get_json(&self, id: i64) -> Result<Value, ServiceError>;

    async fn create_json(&self, body: Value) -> Result<Value, ServiceError>;

    /// Full replacement; omitted fields take their defaults
    async fn update_json(&self, id: i64, body: Value) -> Result<Value, ServiceError>;

    /// Merge `body` over the current writable fields, then update
    async fn patch_json(&self, id: i64, body: Value) -> Result<Value, ServiceError>;

    /// Validate a PATCH body against the current row without writing it
    async fn check_patch_json(&self, id: i64, body: Value) -> Result<(), ServiceError>;

    async fn delete(&self, id: i64) -> Result<(), ServiceError>;

    async fn delete_many(&self, ids: &[i64]) -> Result<u64, ServiceError>;

    async fn run_action(&self, action: &str, ids: &[i64]) -> Result<Option<u64>, ServiceError>;

    /// Total number of rows
    async fn count(&self) -> Result<i64, ServiceError>;
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value)
        .map_err(|e| ServiceError::InternalError(anyhow::anyhow!("Failed to serialize: {}", e)))
}

/// Decode a request body into a resource's input type.
///
/// Unknown keys (including read-only ones such as `id`) are ignored. Type
/// errors are reported under `non_field_errors`.
pub fn decode_input<T: DeserializeOwned>(body: Value) -> Result<T, ServiceError> {
    if !body.is_object() {
        return Err(FieldErrors::single(
            NON_FIELD_ERRORS,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(&body)
            ),
        )
        .into());
    }
    serde_json::from_value(body)
        .map_err(|e| FieldErrors::single(NON_FIELD_ERRORS, e.to_string()).into())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Overlay the top-level keys of `patch` onto `base`
fn merge_objects(base: Value, patch: Value) -> Result<Value, ServiceError> {
    let Value::Object(patch) = patch else {
        return decode_input::<Value>(patch);
    };
    let mut merged = match base {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    for (key, value) in patch {
        merged.insert(key, value);
    }
    Ok(Value::Object(merged))
}

/// The current writable view of row `id` with `body` merged over it
async fn patched_input<R: Resource>(
    resource: &R,
    id: i64,
    body: Value,
) -> Result<R::Input, ServiceError> {
    let current = resource.get(id).await?;
    let base = to_json(&resource.input_from(&current))?;
    decode_input::<R::Input>(merge_objects(base, body)?)
}

#[async_trait]
impl<R: Resource> DynResource for R {
    fn name(&self) -> &'static str {
        Resource::name(self)
    }

    fn list_spec(&self) -> &'static ListSpec {
        Resource::list_spec(self)
    }

    async fn list_json(&self, query: &ListQuery) -> Result<Page<Value>, ServiceError> {
        Resource::list(self, query).await?.try_map(|item| to_json(&item))
    }

    async fn get_json(&self, id: i64) -> Result<Value, ServiceError> {
        to_json(&Resource::get(self, id).await?)
    }

    async fn create_json(&self, body: Value) -> Result<Value, ServiceError> {
        let input = decode_input::<R::Input>(body)?;
        to_json(&Resource::create(self, input).await?)
    }

    async fn update_json(&self, id: i64, body: Value) -> Result<Value, ServiceError> {
        let input = decode_input::<R::Input>(body)?;
        to_json(&Resource::update(self, id, input).await?)
    }

    async fn patch_json(&self, id: i64, body: Value) -> Result<Value, ServiceError> {
        let input = patched_input(self, id, body).await?;
        to_json(&Resource::update(self, id, input).await?)
    }

    async fn check_patch_json(&self, id: i64, body: Value) -> Result<(), ServiceError> {
        let input = patched_input(self, id, body).await?;
        Resource::check_update(self, id, input).await
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Resource::delete(self, id).await
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64, ServiceError> {
        Resource::delete_many(self, ids).await
    }

    async fn run_action(&self, action: &str, ids: &[i64]) -> Result<Option<u64>, ServiceError> {
        Resource::run_action(self, action, ids).await
    }

    async fn count(&self) -> Result<i64, ServiceError> {
        let query = ListQuery::default().with_page_size(1);
        Ok(Resource::list(self, &query).await?.total)
    }
}

/// Resources by URL name, in registration order
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    order: Vec<&'static str>,
    resources: HashMap<&'static str, Arc<dyn DynResource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: Arc<dyn DynResource>) {
        let name = resource.name();
        if self.resources.insert(name, resource).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynResource>> {
        self.resources.get(name).cloned()
    }

    pub fn names(&self) -> &[&'static str] {
        &self.order
    }
}

/// Drops cached entries after a write.
///
/// Clears the resource's own `prefix:*` keys and the homepage context,
/// which summarises every entity. Each call also bumps a shared write
/// generation so readers can tell that a value they built is stale.
#[derive(Clone)]
pub struct Invalidator {
    cache: Arc<Cache>,
    generation: Arc<AtomicU64>,
}

pub const HOME_CACHE_PATTERN: &str = "home:*";

impl Invalidator {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Number of invalidations so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn invalidate(&self, prefix: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let own = format!("{}:*", prefix);
        for pattern in [own.as_str(), HOME_CACHE_PATTERN] {
            if let Err(e) = self.cache.delete_pattern(pattern).await {
                tracing::warn!("Failed to invalidate cache pattern {}: {}", pattern, e);
            }
        }
    }
}
