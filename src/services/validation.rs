//! Field validation
//!
//! A [`Validator`] collects messages for every failing field instead of
//! stopping at the first one, so a client sees all problems with a
//! submission at once.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ServiceError;
use crate::db::repositories::common;
use crate::db::DynDatabasePool;
use crate::models::FieldErrors;

pub const BLANK: &str = "This field may not be blank.";
pub const REQUIRED: &str = "This field is required.";
pub const INVALID_URL: &str = "Enter a valid URL.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const EMPTY_LIST: &str = "This list may not be empty.";
pub const INVALID_SLUG: &str =
    "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.";

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:http|ftp)s?://(?:[^\s:@/]+(?::[^\s:@/]*)?@)?(?:localhost|\d{1,3}(?:\.\d{1,3}){3}|\[[0-9a-f:.]+\]|(?:[^\s./:?#\-_][^\s./:?#]*\.)+[^\s./:?#\d\-]{2,63}\.?)(?::\d{1,5})?(?:[/?#][^\s]*)?$",
    )
    .expect("valid URL pattern")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@(?:localhost|[^\s@.]+(?:\.[^\s@.]+)+)$").expect("valid email pattern")
});

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-\w]+$").expect("valid slug pattern"));

pub fn is_valid_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_valid_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

pub fn invalid_pk(id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

/// Accumulates field errors
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.add(field, message);
        self
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains(field)
    }

    /// Non-blank text no longer than `max` characters
    pub fn text(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            return self.add(field, BLANK);
        }
        self.max_chars(field, value, max)
    }

    /// Optional text no longer than `max` characters
    pub fn max_chars(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.add(
                field,
                format!("Ensure this field has no more than {} characters.", max),
            );
        }
        self
    }

    /// Non-blank text without a length limit
    pub fn required_text(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, BLANK);
        }
        self
    }

    pub fn url(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            return self.add(field, BLANK);
        }
        self.optional_url(field, Some(value), max)
    }

    pub fn optional_url(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            if !is_valid_url(value) {
                self.add(field, INVALID_URL);
            }
            self.max_chars(field, value, max);
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.add(field, BLANK);
        }
        if !is_valid_email(value) {
            self.add(field, INVALID_EMAIL);
        }
        self.max_chars(field, value, 254)
    }

    /// A foreign key that must be present
    pub fn required_id(&mut self, field: &str, value: Option<i64>) -> &mut Self {
        if value.is_none() {
            self.add(field, REQUIRED);
        }
        self
    }

    pub fn non_empty(&mut self, field: &str, ids: &[i64]) -> &mut Self {
        if ids.is_empty() {
            self.add(field, EMPTY_LIST);
        }
        self
    }

    /// Explicit slugs must match `^[-\w]+$`
    pub fn slug(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if !value.is_empty() {
            if !is_valid_slug(value) {
                self.add(field, INVALID_SLUG);
            }
            self.max_chars(field, value, max);
        }
        self
    }

    /// Required integer within `min..=max`
    pub fn int_range(&mut self, field: &str, value: Option<i64>, min: i64, max: i64) -> &mut Self {
        match value {
            None => self.add(field, REQUIRED),
            Some(v) if v < min => self.add(
                field,
                format!("Ensure this value is greater than or equal to {}.", min),
            ),
            Some(v) if v > max => self.add(
                field,
                format!("Ensure this value is less than or equal to {}.", max),
            ),
            Some(_) => self,
        }
    }

    /// Optional non-negative decimal with `max_digits` digits, `places` of
    /// them after the point
    pub fn decimal(
        &mut self,
        field: &str,
        value: Option<f64>,
        max_digits: usize,
        places: usize,
    ) -> &mut Self {
        let Some(value) = value else {
            return self;
        };
        if !value.is_finite() {
            return self.add(field, "A valid number is required.");
        }
        if value < 0.0 {
            return self.add(field, "Ensure this value is greater than or equal to 0.");
        }

        // The shortest round-trip representation is what the client sent
        let text = value.to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((&text, ""));
        let whole_digits = whole.trim_start_matches('0').len();
        let fraction_digits = fraction.len();

        if whole_digits + fraction_digits > max_digits {
            self.add(
                field,
                format!("Ensure that there are no more than {} digits in total.", max_digits),
            );
        } else if fraction_digits > places {
            self.add(
                field,
                format!("Ensure that there are no more than {} decimal places.", places),
            );
        } else if whole_digits > max_digits - places {
            self.add(
                field,
                format!(
                    "Ensure that there are no more than {} digits before the decimal point.",
                    max_digits - places
                ),
            );
        }
        self
    }

    /// Report ids that are not in `existing`
    pub fn references<'a>(
        &mut self,
        field: &str,
        ids: impl IntoIterator<Item = &'a i64>,
        existing: &std::collections::HashSet<i64>,
    ) -> &mut Self {
        for id in ids {
            if !existing.contains(id) {
                self.add(field, invalid_pk(*id));
            }
        }
        self
    }

    /// Look up `ids` in `table` and report the missing ones under `field`
    pub async fn exists(
        &mut self,
        pool: &DynDatabasePool,
        field: &str,
        table: &str,
        ids: &[i64],
    ) -> Result<&mut Self, ServiceError> {
        let existing = common::existing_ids(pool, table, ids).await?;
        Ok(self.references(field, ids, &existing))
    }

    /// [`Validator::exists`] for an optional single reference
    pub async fn exists_opt(
        &mut self,
        pool: &DynDatabasePool,
        field: &str,
        table: &str,
        id: Option<i64>,
    ) -> Result<&mut Self, ServiceError> {
        match id {
            Some(id) => self.exists(pool, field, table, &[id]).await,
            None => Ok(self),
        }
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }

    pub fn finish(self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.errors))
        }
    }
}
