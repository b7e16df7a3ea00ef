//! Driver dispatch helpers
//!
//! Repository bodies are written once and expanded for each backend. Inside
//! `with_pool!` the connection identifier is a concrete `&SqlitePool` or
//! `&MySqlPool`, so `sqlx::query_as`, `FromRow` and the bind calls resolve
//! against that driver.

/// Run `$body` against whichever pool the handle wraps.
///
/// `$db` is bound to the sqlx database type of the active branch.
macro_rules! with_pool {
    ($pool:expr, |$conn:ident, $db:ident| $body:expr) => {{
        match $pool.driver() {
            $crate::config::DatabaseDriver::Sqlite => {
                #[allow(dead_code)]
                type $db = ::sqlx::Sqlite;
                let $conn = $pool
                    .as_sqlite()
                    .ok_or_else(|| ::anyhow::anyhow!("SQLite pool unavailable"))?;
                $body
            }
            $crate::config::DatabaseDriver::Mysql => {
                #[allow(dead_code)]
                type $db = ::sqlx::MySql;
                let $conn = $pool
                    .as_mysql()
                    .ok_or_else(|| ::anyhow::anyhow!("MySQL pool unavailable"))?;
                $body
            }
        }
    }};
    ($pool:expr, |$conn:ident| $body:expr) => {
        $crate::db::with_pool!($pool, |$conn, __Db| $body)
    };
}

/// Bind a slice of [`SqlValue`](crate::db::SqlValue) onto a query in order.
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values.iter() {
            query = match value {
                $crate::db::SqlValue::Int(v) => query.bind(*v),
                $crate::db::SqlValue::Text(v) => query.bind(v.clone()),
                $crate::db::SqlValue::Bool(v) => query.bind(*v),
                $crate::db::SqlValue::Timestamp(v) => query.bind(*v),
            };
        }
        query
    }};
}

/// Replace the many-to-many links of one owner inside an open transaction.
///
/// Duplicate target ids are collapsed.
macro_rules! replace_links {
    ($tx:ident, $table:literal, $owner:literal, $target:literal, $owner_id:expr, $ids:expr) => {{
        ::anyhow::Context::context(
            ::sqlx::query(concat!("DELETE FROM ", $table, " WHERE ", $owner, " = ?"))
                .bind($owner_id)
                .execute(&mut *$tx)
                .await,
            concat!("Failed to clear ", $table),
        )?;
        let targets: ::std::collections::BTreeSet<i64> = $ids.iter().copied().collect();
        for target in targets {
            ::anyhow::Context::context(
                ::sqlx::query(concat!(
                    "INSERT INTO ", $table, " (", $owner, ", ", $target, ") VALUES (?, ?)"
                ))
                .bind($owner_id)
                .bind(target)
                .execute(&mut *$tx)
                .await,
                concat!("Failed to write ", $table),
            )?;
        }
    }};
}

pub(crate) use bind_values;
pub(crate) use replace_links;
pub(crate) use with_pool;
