//! Database layer
//!
//! SQLite is the default backend and MySQL is supported for larger
//! deployments; the driver comes from configuration. Everything above this
//! module talks to a [`DynDatabasePool`] and the repository traits.
//!
//! ```ignore
//! use toolhub::config::DatabaseConfig;
//! use toolhub::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

mod macros;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repositories;

use chrono::{DateTime, Utc};

pub(crate) use macros::{bind_values, replace_links, with_pool};
pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
pub use query::{FilterField, FilterKind, ListQuery, ListSpec, ListSql, Page};

/// A value bound into dynamically assembled SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

/// Backend-neutral access to the id generated by an INSERT.
pub trait LastInsertId {
    fn inserted_id(&self) -> i64;
}

impl LastInsertId for sqlx::sqlite::SqliteQueryResult {
    fn inserted_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

impl LastInsertId for sqlx::mysql::MySqlQueryResult {
    fn inserted_id(&self) -> i64 {
        self.last_insert_id() as i64
    }
}

/// `?, ?, ?` for an `IN (...)` list of `n` items.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
