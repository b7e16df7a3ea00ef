//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{FieldErrors, NON_FIELD_ERRORS};
use crate::services::{DynResource, ServiceError};

/// A JSON request body whose parse failures are reported as validation
/// errors under `non_field_errors`. An empty body reads as `{}`.
#[derive(Debug)]
pub struct JsonBody(pub Value);

impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read body: {}", e)))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Value::Object(Default::default())));
        }

        serde_json::from_slice(&bytes).map(Self).map_err(|e| {
            ServiceError::from(FieldErrors::single(
                NON_FIELD_ERRORS,
                format!("JSON parse error - {}", e),
            ))
            .into()
        })
    }
}

impl JsonBody {
    /// Decode the body into a typed request
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T, ApiError> {
        crate::services::resource::decode_input(self.0).map_err(ApiError::from)
    }
}

/// Body of a bulk action request
#[derive(Debug, Default, Deserialize)]
pub struct IdsRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// Look up a registered resource by its URL name
pub fn resource(state: &AppState, name: &str) -> Result<Arc<dyn DynResource>, ApiError> {
    state
        .services
        .registry
        .get(name)
        .ok_or_else(|| ApiError::not_found(format!("Resource {} not found", name)))
}
