//! Database migrations
//!
//! Migrations are embedded as SQL strings, one variant per backend, and
//! applied in version order. Applied versions are recorded in `_migrations`.
//!
//! ```ignore
//! use toolhub::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Timestamps are always bound from application code, so neither backend
//! relies on column defaults for them. Join tables and tool-owned rows
//! cascade on delete; user references are set to NULL.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::{with_pool, DynDatabasePool};
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All schema migrations, in order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                email VARCHAR(254) NOT NULL,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                email VARCHAR(254) NOT NULL,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at DATETIME(6) NOT NULL,
                created_at DATETIME(6) NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(100) NOT NULL UNIQUE,
                icon VARCHAR(50) NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(100) NOT NULL UNIQUE,
                icon VARCHAR(50) NOT NULL,
                description TEXT NOT NULL,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_pricing_plans",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS pricing_plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                price REAL,
                is_free BOOLEAN NOT NULL DEFAULT 0,
                description TEXT NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS pricing_plans (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                price DOUBLE,
                is_free BOOLEAN NOT NULL DEFAULT FALSE,
                description TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_ai_tools",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS ai_tools (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                short_description VARCHAR(300) NOT NULL,
                long_description TEXT NOT NULL,
                website_url VARCHAR(200) NOT NULL,
                logo VARCHAR(255),
                logo_url VARCHAR(200),
                featured BOOLEAN NOT NULL DEFAULT 0,
                pricing_type VARCHAR(20) NOT NULL,
                launch_date DATE,
                created_by INTEGER,
                is_verified BOOLEAN NOT NULL DEFAULT 0,
                views INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_ai_tools_created_at ON ai_tools(created_at);
            CREATE INDEX IF NOT EXISTS idx_ai_tools_name ON ai_tools(name);
            CREATE TABLE IF NOT EXISTS tool_categories (
                tool_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                PRIMARY KEY (tool_id, category_id),
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tool_categories_category ON tool_categories(category_id);
            CREATE TABLE IF NOT EXISTS tool_pricing_plans (
                tool_id INTEGER NOT NULL,
                pricing_plan_id INTEGER NOT NULL,
                PRIMARY KEY (tool_id, pricing_plan_id),
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE,
                FOREIGN KEY (pricing_plan_id) REFERENCES pricing_plans(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS ai_tools (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                short_description VARCHAR(300) NOT NULL,
                long_description TEXT NOT NULL,
                website_url VARCHAR(200) NOT NULL,
                logo VARCHAR(255),
                logo_url VARCHAR(200),
                featured BOOLEAN NOT NULL DEFAULT FALSE,
                pricing_type VARCHAR(20) NOT NULL,
                launch_date DATE,
                created_by BIGINT,
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                views BIGINT NOT NULL DEFAULT 0,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL,
                FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_ai_tools_created_at ON ai_tools(created_at);
            CREATE INDEX idx_ai_tools_name ON ai_tools(name);
            CREATE TABLE IF NOT EXISTS tool_categories (
                tool_id BIGINT NOT NULL,
                category_id BIGINT NOT NULL,
                PRIMARY KEY (tool_id, category_id),
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_tool_categories_category ON tool_categories(category_id);
            CREATE TABLE IF NOT EXISTS tool_pricing_plans (
                tool_id BIGINT NOT NULL,
                pricing_plan_id BIGINT NOT NULL,
                PRIMARY KEY (tool_id, pricing_plan_id),
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE,
                FOREIGN KEY (pricing_plan_id) REFERENCES pricing_plans(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 6,
        name: "create_tool_media_and_features",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tool_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tool_id INTEGER NOT NULL,
                image VARCHAR(255) NOT NULL,
                caption VARCHAR(200) NOT NULL,
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tool_images_tool ON tool_images(tool_id);
            CREATE TABLE IF NOT EXISTS tool_videos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tool_id INTEGER NOT NULL,
                video_url VARCHAR(200) NOT NULL,
                caption VARCHAR(200) NOT NULL,
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tool_videos_tool ON tool_videos(tool_id);
            CREATE TABLE IF NOT EXISTS features (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tool_id INTEGER NOT NULL,
                name VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(50) NOT NULL,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_features_tool ON features(tool_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tool_images (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                tool_id BIGINT NOT NULL,
                image VARCHAR(255) NOT NULL,
                caption VARCHAR(200) NOT NULL,
                is_featured BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS tool_videos (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                tool_id BIGINT NOT NULL,
                video_url VARCHAR(200) NOT NULL,
                caption VARCHAR(200) NOT NULL,
                is_featured BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS features (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                tool_id BIGINT NOT NULL,
                name VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                icon VARCHAR(50) NOT NULL,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 7,
        name: "create_reviews",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tool_id INTEGER NOT NULL,
                user_id INTEGER,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                title VARCHAR(200) NOT NULL,
                content TEXT NOT NULL,
                is_approved BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_reviews_tool ON reviews(tool_id);
            CREATE INDEX IF NOT EXISTS idx_reviews_created_at ON reviews(created_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                tool_id BIGINT NOT NULL,
                user_id BIGINT,
                rating INT NOT NULL CHECK (rating BETWEEN 1 AND 5),
                title VARCHAR(200) NOT NULL,
                content TEXT NOT NULL,
                is_approved BOOLEAN NOT NULL DEFAULT FALSE,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_reviews_created_at ON reviews(created_at);
        "#,
    },
    Migration {
        version: 8,
        name: "create_comparisons",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS comparisons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                content TEXT NOT NULL,
                author_id INTEGER,
                is_published BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE TABLE IF NOT EXISTS comparison_tools (
                comparison_id INTEGER NOT NULL,
                tool_id INTEGER NOT NULL,
                PRIMARY KEY (comparison_id, tool_id),
                FOREIGN KEY (comparison_id) REFERENCES comparisons(id) ON DELETE CASCADE,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS comparisons (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                content TEXT NOT NULL,
                author_id BIGINT,
                is_published BOOLEAN NOT NULL DEFAULT FALSE,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE TABLE IF NOT EXISTS comparison_tools (
                comparison_id BIGINT NOT NULL,
                tool_id BIGINT NOT NULL,
                PRIMARY KEY (comparison_id, tool_id),
                FOREIGN KEY (comparison_id) REFERENCES comparisons(id) ON DELETE CASCADE,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 9,
        name: "create_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                content TEXT NOT NULL,
                excerpt TEXT NOT NULL,
                author_id INTEGER,
                featured_image VARCHAR(255),
                is_published BOOLEAN NOT NULL DEFAULT 0,
                views INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at);
            CREATE TABLE IF NOT EXISTS article_categories (
                article_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                PRIMARY KEY (article_id, category_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS article_related_tools (
                article_id INTEGER NOT NULL,
                tool_id INTEGER NOT NULL,
                PRIMARY KEY (article_id, tool_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                content TEXT NOT NULL,
                excerpt TEXT NOT NULL,
                author_id BIGINT,
                featured_image VARCHAR(255),
                is_published BOOLEAN NOT NULL DEFAULT FALSE,
                views BIGINT NOT NULL DEFAULT 0,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_articles_created_at ON articles(created_at);
            CREATE TABLE IF NOT EXISTS article_categories (
                article_id BIGINT NOT NULL,
                category_id BIGINT NOT NULL,
                PRIMARY KEY (article_id, category_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS article_related_tools (
                article_id BIGINT NOT NULL,
                tool_id BIGINT NOT NULL,
                PRIMARY KEY (article_id, tool_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (tool_id) REFERENCES ai_tools(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 10,
        name: "create_lead_capture",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS newsletter_subscribers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(254) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL,
                subscribed_at TIMESTAMP NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                unsubscribe_token VARCHAR(50) NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS contact_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(254) NOT NULL,
                subject VARCHAR(200) NOT NULL,
                message TEXT NOT NULL,
                submitted_at TIMESTAMP NOT NULL,
                is_processed BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS tool_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tool_name VARCHAR(200) NOT NULL,
                tool_url VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                submitted_by INTEGER,
                submitted_at TIMESTAMP NOT NULL,
                is_processed BOOLEAN NOT NULL DEFAULT 0,
                FOREIGN KEY (submitted_by) REFERENCES users(id) ON DELETE SET NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS newsletter_subscribers (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(254) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL,
                subscribed_at DATETIME(6) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                unsubscribe_token VARCHAR(50) NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS contact_submissions (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(254) NOT NULL,
                subject VARCHAR(200) NOT NULL,
                message TEXT NOT NULL,
                submitted_at DATETIME(6) NOT NULL,
                is_processed BOOLEAN NOT NULL DEFAULT FALSE
            );
            CREATE TABLE IF NOT EXISTS tool_submissions (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                tool_name VARCHAR(200) NOT NULL,
                tool_url VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                submitted_by BIGINT,
                submitted_at DATETIME(6) NOT NULL,
                is_processed BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (submitted_by) REFERENCES users(id) ON DELETE SET NULL
            );
        "#,
    },
    Migration {
        version: 11,
        name: "create_site_stats",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS site_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stat_name VARCHAR(100) NOT NULL UNIQUE,
                stat_value VARCHAR(100) NOT NULL,
                icon VARCHAR(50) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS site_stats (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                stat_name VARCHAR(100) NOT NULL UNIQUE,
                stat_value VARCHAR(100) NOT NULL,
                icon VARCHAR(50) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            );
        "#,
    },
];

/// Apply every pending migration and return how many ran
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;
    for migration in MIGRATIONS {
        if applied_versions.contains(&(migration.version as i64)) {
            continue;
        }
        tracing::info!(
            "Applying migration {}: {}",
            migration.version,
            migration.name
        );
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at DATETIME(6) NOT NULL
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
pub async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    let sql = "SELECT version, name, applied_at FROM _migrations ORDER BY version";
    with_pool!(pool, |conn| {
        sqlx::query_as::<_, MigrationRecord>(sql)
            .fetch_all(conn)
            .await
            .context("Failed to read applied migrations")
    })
}

/// Apply a single migration inside a transaction
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => migration.up_sqlite,
        DatabaseDriver::Mysql => migration.up_mysql,
    };

    with_pool!(pool, |conn| {
        // MySQL commits DDL implicitly, so the transaction only protects the
        // bookkeeping row there; SQLite rolls the whole migration back.
        let mut tx = conn.begin().await?;
        for statement in split_sql_statements(sql) {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }

        sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
            .bind(migration.version as i64)
            .bind(migration.name)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    })
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.iter().any(|a| a.version == m.version as i64))
        .count())
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

/// Get migration by version
pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}
