//! Slug generation
//!
//! Slugs keep non-ASCII letters and digits, so "Café Tools" becomes
//! `café-tools`. A derived slug that is already taken gets a numeric
//! suffix: `writer`, `writer-2`, `writer-3`.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;

use super::validation::Validator;
use super::ServiceError;

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid pattern"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid pattern"));

/// Lowercase, drop punctuation, join words with `-`.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let cleaned = DISALLOWED.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(cleaned.trim(), "-");
    joined.trim_matches(|c| c == '-' || c == '_').to_string()
}

fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// First candidate from `base`, `base-2`, `base-3`, ... that `taken`
/// reports as free, each cut to `max_len` characters.
pub async fn unique_slug<F, Fut>(base: &str, max_len: usize, mut taken: F) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let first = truncate_chars(base, max_len).trim_end_matches('-').to_string();
    if !taken(first.clone()).await? {
        return Ok(first);
    }

    let mut n: u64 = 2;
    loop {
        let suffix = format!("-{}", n);
        let keep = max_len.saturating_sub(suffix.chars().count());
        let candidate = format!(
            "{}{}",
            truncate_chars(base, keep).trim_end_matches('-'),
            suffix
        );
        if !taken(candidate.clone()).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Message used when a name or title yields no slug characters
pub const UNDERIVABLE: &str = "Could not generate a slug from this value; enter one explicitly.";

/// Settle the `slug` field of a write.
///
/// An explicit slug is checked for shape and uniqueness and kept as is. A
/// blank one is derived from `source` and made unique.
pub async fn resolve_slug<F, Fut>(
    v: &mut Validator,
    explicit: &str,
    source: &str,
    max_len: usize,
    taken_message: &str,
    mut taken: F,
) -> Result<String, ServiceError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let explicit = explicit.trim();
    if !explicit.is_empty() {
        v.slug("slug", explicit, max_len);
        if !v.has("slug") && taken(explicit.to_string()).await? {
            v.add("slug", taken_message);
        }
        return Ok(explicit.to_string());
    }

    let base = slugify(source);
    if base.is_empty() {
        v.add("slug", UNDERIVABLE);
        return Ok(base);
    }
    Ok(unique_slug(&base, max_len, taken).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  ChatGPT -- 4 turbo! "), "chatgpt-4-turbo");
        assert_eq!(slugify("Café Tools"), "café-tools");
        assert_eq!(slugify("_private_"), "private");
        assert_eq!(slugify("AI/ML & Data"), "aiml-data");
        assert_eq!(slugify("!!!"), "");
    }

    #[tokio::test]
    async fn test_unique_slug_appends_counter() {
        let existing: HashSet<String> = ["writer", "writer-2"].iter().map(|s| s.to_string()).collect();
        let slug = unique_slug("writer", 200, |candidate| {
            let taken = existing.contains(&candidate);
            async move { Ok(taken) }
        })
        .await
        .unwrap();
        assert_eq!(slug, "writer-3");
    }

    #[tokio::test]
    async fn test_unique_slug_respects_max_length() {
        let base = "a".repeat(10);
        let slug = unique_slug(&base, 10, |candidate| {
            let taken = candidate == base;
            async move { Ok(taken) }
        })
        .await
        .unwrap();
        assert_eq!(slug, format!("{}-2", "a".repeat(8)));
        assert_eq!(slug.chars().count(), 10);
    }

    #[tokio::test]
    async fn test_resolve_slug() {
        let free = |_: String| async { Ok(false) };
        let busy = |_: String| async { Ok(true) };

        let mut v = Validator::new();
        let slug = resolve_slug(&mut v, "", "My Tool", 200, "taken", free).await.unwrap();
        assert_eq!(slug, "my-tool");
        assert!(v.finish().is_ok());

        let mut v = Validator::new();
        resolve_slug(&mut v, "bad slug", "x", 200, "taken", free).await.unwrap();
        assert!(v.has("slug"));

        let mut v = Validator::new();
        resolve_slug(&mut v, "my-tool", "x", 200, "taken", busy).await.unwrap();
        assert_eq!(v.into_errors().get("slug").unwrap(), ["taken"]);

        let mut v = Validator::new();
        resolve_slug(&mut v, "", "???", 200, "taken", free).await.unwrap();
        assert_eq!(v.into_errors().get("slug").unwrap(), [UNDERIVABLE]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn slugs_match_slug_shape(input in "\\PC{0,40}") {
            let slug = slugify(&input);
            prop_assert!(slug.is_empty() || crate::services::validation::is_valid_slug(&slug));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.chars().any(char::is_whitespace));
        }
    }
}
