//! Query helpers shared by the repositories
//!
//! Table and column names passed here always come from static strings in
//! the repositories, never from requests.

use anyhow::{Context, Result};
use sqlx::mysql::MySqlRow;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use std::collections::{HashMap, HashSet};

use crate::db::{bind_values, placeholders, with_pool, DynDatabasePool, ListSql};

/// Rows decodable from both backends
pub trait AnyRow: for<'r> FromRow<'r, SqliteRow> + for<'r> FromRow<'r, MySqlRow> + Send + Unpin {}

impl<T> AnyRow for T where
    T: for<'r> FromRow<'r, SqliteRow> + for<'r> FromRow<'r, MySqlRow> + Send + Unpin
{
}

/// Run a compiled list query and its count
pub async fn fetch_page<T: AnyRow>(
    pool: &DynDatabasePool,
    list: &ListSql,
    columns: &str,
) -> Result<(Vec<T>, i64)> {
    let count_sql = list.count_sql();
    let select_sql = list.select_sql(columns);

    with_pool!(pool, |conn, Db| {
        let total = bind_values!(sqlx::query_scalar::<Db, i64>(&count_sql), list.binds)
            .fetch_one(conn)
            .await
            .with_context(|| format!("Failed to count {}", list.table))?;

        let rows = bind_values!(sqlx::query_as::<Db, T>(&select_sql), list.binds)
            .bind(list.limit)
            .bind(list.offset)
            .fetch_all(conn)
            .await
            .with_context(|| format!("Failed to list {}", list.table))?;

        Ok((rows, total))
    })
}

/// Fetch at most one row by primary key
pub async fn fetch_by_id<T: AnyRow>(
    pool: &DynDatabasePool,
    table: &str,
    columns: &str,
    id: i64,
) -> Result<Option<T>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?", columns, table);
    with_pool!(pool, |conn, Db| {
        sqlx::query_as::<Db, T>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
            .with_context(|| format!("Failed to get {} {}", table, id))
    })
}

/// Fetch every row whose `column` is one of `ids`, ordered by `order`
pub async fn fetch_where_in<T: AnyRow>(
    pool: &DynDatabasePool,
    table: &str,
    columns: &str,
    column: &str,
    ids: &[i64],
    order: &str,
) -> Result<Vec<T>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY {}",
        columns,
        table,
        column,
        placeholders(ids.len()),
        order
    );
    with_pool!(pool, |conn, Db| {
        let mut query = sqlx::query_as::<Db, T>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        query
            .fetch_all(conn)
            .await
            .with_context(|| format!("Failed to load {} rows", table))
    })
}

/// Load many-to-many links for a set of owners, keyed by owner id.
///
/// Target ids come back in ascending order.
pub async fn fetch_links(
    pool: &DynDatabasePool,
    join_table: &str,
    owner_column: &str,
    target_column: &str,
    owner_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>> {
    let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
    if owner_ids.is_empty() {
        return Ok(links);
    }

    let sql = format!(
        "SELECT {}, {} FROM {} WHERE {} IN ({}) ORDER BY {}",
        owner_column,
        target_column,
        join_table,
        owner_column,
        placeholders(owner_ids.len()),
        target_column
    );
    let rows: Vec<(i64, i64)> = with_pool!(pool, |conn, Db| {
        let mut query = sqlx::query_as::<Db, (i64, i64)>(&sql);
        for id in owner_ids {
            query = query.bind(*id);
        }
        query
            .fetch_all(conn)
            .await
            .with_context(|| format!("Failed to load {}", join_table))?
    });

    for (owner, target) in rows {
        links.entry(owner).or_default().push(target);
    }
    Ok(links)
}

/// Which of `ids` exist in `table`
pub async fn existing_ids(
    pool: &DynDatabasePool,
    table: &str,
    ids: &[i64],
) -> Result<HashSet<i64>> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let sql = format!(
        "SELECT id FROM {} WHERE id IN ({})",
        table,
        placeholders(ids.len())
    );
    let found: Vec<i64> = with_pool!(pool, |conn, Db| {
        let mut query = sqlx::query_scalar::<Db, i64>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        query
            .fetch_all(conn)
            .await
            .with_context(|| format!("Failed to look up {} ids", table))?
    });
    Ok(found.into_iter().collect())
}

/// Whether a row other than `exclude_id` has `column = value`
pub async fn value_taken(
    pool: &DynDatabasePool,
    table: &str,
    column: &str,
    value: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ? AND id <> ?",
        table, column
    );
    let count: i64 = with_pool!(pool, |conn, Db| {
        sqlx::query_scalar::<Db, i64>(&sql)
            .bind(value)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(conn)
            .await
            .with_context(|| format!("Failed to check {}.{}", table, column))?
    });
    Ok(count > 0)
}

/// Delete one row by id; `false` when it didn't exist
pub async fn delete_by_id(pool: &DynDatabasePool, table: &str, id: i64) -> Result<bool> {
    Ok(delete_by_ids(pool, table, &[id]).await? > 0)
}

/// Delete rows by id and return how many went
pub async fn delete_by_ids(pool: &DynDatabasePool, table: &str, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM {} WHERE id IN ({})",
        table,
        placeholders(ids.len())
    );
    with_pool!(pool, |conn, Db| {
        let mut query = sqlx::query::<Db>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let result = query
            .execute(conn)
            .await
            .with_context(|| format!("Failed to delete from {}", table))?;
        Ok(result.rows_affected())
    })
}

/// Set a boolean column on the given rows
pub async fn set_flag(
    pool: &DynDatabasePool,
    table: &str,
    column: &str,
    value: bool,
    ids: &[i64],
) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "UPDATE {} SET {} = ? WHERE id IN ({})",
        table,
        column,
        placeholders(ids.len())
    );
    with_pool!(pool, |conn, Db| {
        let mut query = sqlx::query::<Db>(&sql).bind(value);
        for id in ids {
            query = query.bind(*id);
        }
        let result = query
            .execute(conn)
            .await
            .with_context(|| format!("Failed to update {}.{}", table, column))?;
        Ok(result.rows_affected())
    })
}

/// Row count of a table
pub async fn count_rows(pool: &DynDatabasePool, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    with_pool!(pool, |conn, Db| {
        sqlx::query_scalar::<Db, i64>(&sql)
            .fetch_one(conn)
            .await
            .with_context(|| format!("Failed to count {}", table))
    })
}

/// Atomically add one to a `views` column and return the new value
pub async fn increment_views(pool: &DynDatabasePool, table: &str, id: i64) -> Result<Option<i64>> {
    let update = format!("UPDATE {} SET views = views + 1 WHERE id = ?", table);
    let select = format!("SELECT views FROM {} WHERE id = ?", table);
    with_pool!(pool, |conn, Db| {
        let mut tx = conn.begin().await?;
        let result = sqlx::query::<Db>(&update)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to increment {} views", table))?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        let views = sqlx::query_scalar::<Db, i64>(&select)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(views))
    })
}
