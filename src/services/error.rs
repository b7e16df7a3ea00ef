//! Error type shared by the resource services

use crate::models::FieldErrors;

/// Error types for resource service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The addressed row does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// One or more fields failed validation
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// The write collides with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        ServiceError::NotFound(entity.into())
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ServiceError::not_found("Category").to_string(), "Category not found");

        let err: ServiceError = FieldErrors::single("name", "This field may not be blank.").into();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("name")));
    }
}
