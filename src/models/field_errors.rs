//! Per-field validation messages

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key used for errors that don't belong to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Validation messages keyed by field name.
///
/// Serializes as a plain object, e.g. `{"rating": ["Ensure this value is less than or equal to 5."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors holding a single message
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(value)` when no errors were collected
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_object_of_lists() {
        let mut errors = FieldErrors::new();
        errors.add("name", "This field is required.");
        errors.add("name", "second");
        errors.add("slug", "taken");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": ["This field is required.", "second"], "slug": ["taken"]})
        );
    }

    #[test]
    fn test_merge_and_into_result() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.clone().into_result(1), Ok(1));

        errors.merge(FieldErrors::single("rating", "too high"));
        assert!(errors.contains("rating"));
        assert_eq!(errors.to_string(), "rating: too high");
        assert!(errors.into_result(1).is_err());
    }
}
