//! List queries: search, filters, ordering and pagination
//!
//! Each resource declares a static [`ListSpec`] naming its searchable
//! columns, its filter parameters and the fields it may be ordered by. A
//! [`ListQuery`] parsed from the request is compiled against that [`ListSpec`] into
//! a [`ListSql`], a WHERE/ORDER BY fragment plus positional binds that run
//! unchanged on SQLite and MySQL.
//!
//! Only identifiers from the [`ListSpec`] are interpolated into SQL; every
//! user-supplied value is bound.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::SqlValue;
use crate::models::FieldErrors;

/// Default page size for lists
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on a client-requested page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters that are never treated as filters
const RESERVED_PARAMS: &[&str] = &["page", "page_size", "search", "ordering"];

/// How a filter parameter maps onto SQL
#[derive(Debug, Clone, Copy)]
pub enum FilterKind {
    /// Boolean column; accepts `true/false/1/0`
    Bool(&'static str),
    /// Integer column, typically a foreign key
    Int(&'static str),
    /// Exact text match
    Text(&'static str),
    /// Text column restricted to a fixed set of values
    Choice(&'static str, &'static [&'static str]),
    /// Membership through a join table: rows whose id appears as
    /// `owner_column` next to the given `target_column` value
    Related {
        join_table: &'static str,
        owner_column: &'static str,
        target_column: &'static str,
    },
    /// Timestamp column filtered by a named range
    Date(&'static str),
}

/// A filter parameter accepted by a list endpoint
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub param: &'static str,
    pub kind: FilterKind,
}

/// Static list configuration for one table
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    pub table: &'static str,
    /// SQL expressions matched by `?search=`; an expression may be a
    /// correlated subquery such as the name of a related row
    pub search: &'static [&'static str],
    pub filters: &'static [FilterField],
    /// Columns accepted by `?ordering=`
    pub ordering: &'static [&'static str],
    /// ORDER BY used when the client asks for nothing valid
    pub default_order: &'static str,
}

/// Date range presets for [`FilterKind::Date`]
pub const DATE_PRESETS: &[&str] = &["today", "past_7_days", "this_month", "this_year"];

/// Parsed list parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: i64,
    pub page_size: i64,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            ordering: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    /// Build from raw query-string parameters.
    ///
    /// `page` must be a positive integer. `page_size` is clamped to
    /// `1..=MAX_PAGE_SIZE`. Every other non-empty parameter is kept as a
    /// candidate filter; the resource's `ListSpec` picks the ones it knows.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        let mut query = ListQuery::default();
        let mut errors = FieldErrors::new();

        if let Some(page) = params.get("page").filter(|p| !p.is_empty()) {
            match page.parse::<i64>() {
                Ok(page) if page >= 1 => query.page = page,
                _ => errors.add("page", "A valid page number is required."),
            }
        }

        if let Some(size) = params.get("page_size").filter(|p| !p.is_empty()) {
            match size.parse::<i64>() {
                Ok(size) if size >= 1 => query.page_size = size.min(MAX_PAGE_SIZE),
                _ => errors.add("page_size", "A valid page size is required."),
            }
        }

        if (query.page - 1).checked_mul(query.page_size).is_none() {
            errors.add("page", "Invalid page.");
        }

        query.search = params
            .get("search")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        query.ordering = params
            .get("ordering")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        for (key, value) in params {
            if RESERVED_PARAMS.contains(&key.as_str()) || value.is_empty() {
                continue;
            }
            query.filters.insert(key.clone(), value.clone());
        }

        errors.into_result(query)
    }

    /// Force a page size, ignoring what the client asked for
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Compile against a [`ListSpec`] using the current time for date presets
    pub fn compile(&self, spec: &ListSpec) -> Result<ListSql, FieldErrors> {
        self.compile_at(spec, Utc::now())
    }

    /// Compile against a spec with an explicit clock
    pub fn compile_at(&self, spec: &ListSpec, now: DateTime<Utc>) -> Result<ListSql, FieldErrors> {
        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<SqlValue> = Vec::new();
        let mut errors = FieldErrors::new();

        if let Some(search) = &self.search {
            if !spec.search.is_empty() {
                for term in search_terms(search) {
                    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
                    let clauses: Vec<String> = spec
                        .search
                        .iter()
                        .map(|expr| format!("LOWER({}) LIKE ? ESCAPE '!'", expr))
                        .collect();
                    for _ in spec.search {
                        binds.push(SqlValue::Text(pattern.clone()));
                    }
                    conditions.push(format!("({})", clauses.join(" OR ")));
                }
            }
        }

        for field in spec.filters {
            let Some(raw) = self.filters.get(field.param) else {
                continue;
            };
            match field.kind {
                FilterKind::Bool(column) => match parse_bool(raw) {
                    Some(value) => {
                        conditions.push(format!("{} = ?", column));
                        binds.push(SqlValue::Bool(value));
                    }
                    None => errors.add(field.param, invalid_choice(raw)),
                },
                FilterKind::Int(column) => match raw.parse::<i64>() {
                    Ok(value) => {
                        conditions.push(format!("{} = ?", column));
                        binds.push(SqlValue::Int(value));
                    }
                    Err(_) => errors.add(field.param, "Enter a whole number."),
                },
                FilterKind::Text(column) => {
                    conditions.push(format!("{} = ?", column));
                    binds.push(SqlValue::Text(raw.clone()));
                }
                FilterKind::Choice(column, choices) => {
                    if choices.contains(&raw.as_str()) {
                        conditions.push(format!("{} = ?", column));
                        binds.push(SqlValue::Text(raw.clone()));
                    } else {
                        errors.add(field.param, invalid_choice(raw));
                    }
                }
                FilterKind::Related {
                    join_table,
                    owner_column,
                    target_column,
                } => match raw.parse::<i64>() {
                    Ok(value) => {
                        conditions.push(format!(
                            "id IN (SELECT {} FROM {} WHERE {} = ?)",
                            owner_column, join_table, target_column
                        ));
                        binds.push(SqlValue::Int(value));
                    }
                    Err(_) => errors.add(field.param, "Enter a whole number."),
                },
                FilterKind::Date(column) => match date_range(raw, now) {
                    Some((start, end)) => {
                        conditions.push(format!("{} >= ? AND {} < ?", column, column));
                        binds.push(SqlValue::Timestamp(start));
                        binds.push(SqlValue::Timestamp(end));
                    }
                    None => errors.add(field.param, invalid_choice(raw)),
                },
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        Ok(ListSql {
            table: spec.table,
            where_clause,
            order_clause: self.order_clause(spec),
            binds,
            limit: self.page_size,
            offset: self.offset(),
        })
    }

    fn order_clause(&self, spec: &ListSpec) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(ordering) = &self.ordering {
            for item in ordering.split(',').map(str::trim) {
                let (column, direction) = match item.strip_prefix('-') {
                    Some(column) => (column, "DESC"),
                    None => (item, "ASC"),
                };
                if spec.ordering.contains(&column) {
                    parts.push(format!("{} {}", column, direction));
                }
            }
        }

        let mut order = if parts.is_empty() {
            spec.default_order.to_string()
        } else {
            parts.join(", ")
        };
        if !parts.iter().any(|p| p.starts_with("id ")) {
            order.push_str(", id DESC");
        }
        order
    }
}

/// SQL fragments for one list request
#[derive(Debug, Clone, PartialEq)]
pub struct ListSql {
    pub table: &'static str,
    /// Empty or ` WHERE ...`
    pub where_clause: String,
    pub order_clause: String,
    pub binds: Vec<SqlValue>,
    pub limit: i64,
    pub offset: i64,
}

impl ListSql {
    /// `SELECT <columns> ... LIMIT ? OFFSET ?`; bind `binds`, then limit and offset
    pub fn select_sql(&self, columns: &str) -> String {
        format!(
            "SELECT {} FROM {}{} ORDER BY {} LIMIT ? OFFSET ?",
            columns, self.table, self.where_clause, self.order_clause
        )
    }

    /// `SELECT COUNT(*) ...` over the same conditions
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}{}", self.table, self.where_clause)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };
        Self {
            results,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    /// Convert every item while keeping the paging numbers
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            results: self.results.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            results: self.results.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        })
    }
}

fn search_terms(search: &str) -> Vec<String> {
    search
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Escape `LIKE` wildcards using `!` as the escape character
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn invalid_choice(raw: &str) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        raw
    )
}

fn start_of(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

/// Half-open `[start, end)` range for a date preset
fn date_range(preset: &str, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let today = now.date_naive();
    let midnight = start_of(today)?;
    let tomorrow = midnight + Duration::days(1);
    match preset {
        "today" => Some((midnight, tomorrow)),
        "past_7_days" => Some((midnight - Duration::days(7), tomorrow)),
        "this_month" => {
            let first = today.with_day(1)?;
            let next = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
            };
            Some((start_of(first)?, start_of(next)?))
        }
        "this_year" => {
            let first = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
            let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?;
            Some((start_of(first)?, start_of(next)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOLS: ListSpec = ListSpec {
        table: "ai_tools",
        search: &["name", "short_description"],
        filters: &[
            FilterField {
                param: "featured",
                kind: FilterKind::Bool("featured"),
            },
            FilterField {
                param: "pricing_type",
                kind: FilterKind::Choice("pricing_type", &["free", "paid"]),
            },
            FilterField {
                param: "categories",
                kind: FilterKind::Related {
                    join_table: "tool_categories",
                    owner_column: "tool_id",
                    target_column: "category_id",
                },
            },
            FilterField {
                param: "created_at",
                kind: FilterKind::Date("created_at"),
            },
        ],
        ordering: &["name", "created_at", "views"],
        default_order: "featured DESC, created_at DESC",
    };

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::from_params(&HashMap::new()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);

        let sql = query.compile(&TOOLS).unwrap();
        assert_eq!(sql.where_clause, "");
        assert_eq!(sql.order_clause, "featured DESC, created_at DESC, id DESC");
        assert_eq!(
            sql.select_sql("*"),
            "SELECT * FROM ai_tools ORDER BY featured DESC, created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(sql.count_sql(), "SELECT COUNT(*) FROM ai_tools");
    }

    #[test]
    fn test_page_size_is_clamped_and_page_validated() {
        let query = ListQuery::from_params(&params(&[("page", "3"), ("page_size", "500")])).unwrap();
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 200);

        let errors = ListQuery::from_params(&params(&[("page", "0")])).unwrap_err();
        assert!(errors.contains("page"));
        let errors = ListQuery::from_params(&params(&[("page", "abc")])).unwrap_err();
        assert!(errors.contains("page"));
    }

    #[test]
    fn test_search_terms_are_anded_and_columns_ored() {
        let query = ListQuery::from_params(&params(&[("search", "chat  bot")])).unwrap();
        let sql = query.compile(&TOOLS).unwrap();

        assert_eq!(
            sql.where_clause,
            " WHERE (LOWER(name) LIKE ? ESCAPE '!' OR LOWER(short_description) LIKE ? ESCAPE '!') \
             AND (LOWER(name) LIKE ? ESCAPE '!' OR LOWER(short_description) LIKE ? ESCAPE '!')"
        );
        assert_eq!(sql.binds.len(), 4);
        assert_eq!(sql.binds[0], SqlValue::Text("%chat%".to_string()));
        assert_eq!(sql.binds[2], SqlValue::Text("%bot%".to_string()));
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let query = ListQuery::from_params(&params(&[("search", "100%_Off!")])).unwrap();
        let sql = query.compile(&TOOLS).unwrap();
        assert_eq!(sql.binds[0], SqlValue::Text("%100!%!_off!!%".to_string()));
    }

    #[test]
    fn test_filters() {
        let query = ListQuery::from_params(&params(&[
            ("featured", "1"),
            ("pricing_type", "free"),
            ("categories", "4"),
            ("unknown", "ignored"),
        ]))
        .unwrap();
        let sql = query.compile(&TOOLS).unwrap();

        assert_eq!(
            sql.where_clause,
            " WHERE featured = ? AND pricing_type = ? AND id IN (SELECT tool_id FROM tool_categories WHERE category_id = ?)"
        );
        assert_eq!(
            sql.binds,
            vec![
                SqlValue::Bool(true),
                SqlValue::Text("free".to_string()),
                SqlValue::Int(4)
            ]
        );
    }

    #[test]
    fn test_invalid_filter_values_are_reported() {
        let query = ListQuery::from_params(&params(&[
            ("featured", "maybe"),
            ("pricing_type", "donation"),
            ("categories", "x"),
            ("created_at", "yesterday"),
        ]))
        .unwrap();
        let errors = query.compile(&TOOLS).unwrap_err();

        for field in ["featured", "pricing_type", "categories", "created_at"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_ordering_whitelist() {
        let query = ListQuery::from_params(&params(&[("ordering", "-views,name,password")])).unwrap();
        let sql = query.compile(&TOOLS).unwrap();
        assert_eq!(sql.order_clause, "views DESC, name ASC, id DESC");

        let query = ListQuery::from_params(&params(&[("ordering", "secret")])).unwrap();
        let sql = query.compile(&TOOLS).unwrap();
        assert_eq!(sql.order_clause, "featured DESC, created_at DESC, id DESC");
    }

    #[test]
    fn test_date_presets() {
        let now = Utc.with_ymd_and_hms(2024, 12, 15, 13, 30, 0).unwrap();

        let (start, end) = date_range("today", now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 15, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 12, 16, 0, 0, 0).unwrap());

        let (start, _) = date_range("past_7_days", now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 8, 0, 0, 0).unwrap());

        let (start, end) = date_range("this_month", now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let (start, end) = date_range("this_year", now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        assert!(date_range("last_century", now).is_none());
    }

    #[test]
    fn test_date_filter_binds_range() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap();
        let query = ListQuery::from_params(&params(&[("created_at", "this_month")])).unwrap();
        let sql = query.compile_at(&TOOLS, now).unwrap();

        assert_eq!(sql.where_clause, " WHERE created_at >= ? AND created_at < ?");
        assert_eq!(
            sql.binds,
            vec![
                SqlValue::Timestamp(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
                SqlValue::Timestamp(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()),
            ]
        );
    }

    #[test]
    fn test_page_offset_overflow_is_rejected() {
        let errors = ListQuery::from_params(&params(&[("page", "9223372036854775807")])).unwrap_err();
        assert_eq!(errors.get("page").unwrap(), ["Invalid page."]);

        let errors = ListQuery::from_params(&params(&[
            ("page", "92233720368547760"),
            ("page_size", "100"),
        ]))
        .unwrap_err();
        assert!(errors.contains("page"));

        let query = ListQuery::from_params(&params(&[("page", "1000000"), ("page_size", "100")])).unwrap();
        assert_eq!(query.offset(), 99_999_900);
    }

    #[test]
    fn test_page_math() {
        let page: Page<i32> = Page::new(vec![1, 2], 41, 3, 20);
        assert_eq!(page.total_pages, 3);
        let page: Page<i32> = Page::new(vec![], 0, 1, 20);
        assert_eq!(page.total_pages, 0);
        let mapped = Page::new(vec![1, 2], 2, 1, 20).map(|v| v * 10);
        assert_eq!(mapped.results, vec![10, 20]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            #[test]
            fn page_size_never_exceeds_max(size in 1i64..10_000) {
                let query = ListQuery::from_params(&params(&[("page_size", &size.to_string())])).unwrap();
                prop_assert!(query.page_size >= 1 && query.page_size <= MAX_PAGE_SIZE);
            }

            #[test]
            fn search_binds_one_value_per_column_and_term(words in proptest::collection::vec("[a-z]{1,8}", 1..5)) {
                let query = ListQuery::from_params(&params(&[("search", &words.join(" "))])).unwrap();
                let sql = query.compile(&TOOLS).unwrap();
                prop_assert_eq!(sql.binds.len(), words.len() * TOOLS.search.len());
            }
        }
    }
}
