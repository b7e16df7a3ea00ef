//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::db::{with_pool, DynDatabasePool, LastInsertId};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::common;

const COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; `user.id` is ignored
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Delete a user; content references are nulled by the schema
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count total users
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                r#"
                INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(conn)
            .await
            .context("Failed to create user")?
            .inserted_id()
        });

        self.get_by_id(id).await?.context("User missing after insert")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        common::fetch_by_id(&self.pool, "users", COLUMNS, id).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", COLUMNS);
        with_pool!(self.pool, |conn, Db| {
            sqlx::query_as::<Db, User>(&sql)
                .bind(username)
                .fetch_optional(conn)
                .await
                .context("Failed to get user by username")
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, "users", id).await
    }

    async fn count(&self) -> Result<i64> {
        common::count_rows(&self.pool, "users").await
    }
}
