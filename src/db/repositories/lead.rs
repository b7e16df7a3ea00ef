//! Repositories for visitor-submitted records: newsletter subscribers,
//! contact messages and tool submissions

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::common;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, ListSql};
use crate::models::{
    ContactSubmission, ContactSubmissionInput, NewsletterSubscriber, NewsletterSubscriberInput,
    ToolSubmission, ToolSubmissionInput,
};

const SUBSCRIBER_COLUMNS: &str =
    "id, email, name, subscribed_at, is_active, unsubscribe_token";
const CONTACT_COLUMNS: &str = "id, name, email, subject, message, submitted_at, is_processed";
const SUBMISSION_COLUMNS: &str =
    "id, tool_name, tool_url, description, submitted_by, submitted_at, is_processed";

#[async_trait]
pub trait NewsletterSubscriberRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<NewsletterSubscriber>, i64)>;
    async fn get_by_id(&self, id: i64) -> Result<Option<NewsletterSubscriber>>;
    async fn get_by_token(&self, token: &str) -> Result<Option<NewsletterSubscriber>>;
    /// Insert with a non-blank token; `subscribed_at` is set here
    async fn create(&self, input: &NewsletterSubscriberInput) -> Result<NewsletterSubscriber>;
    async fn update(
        &self,
        id: i64,
        input: &NewsletterSubscriberInput,
    ) -> Result<Option<NewsletterSubscriber>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> Result<bool>;
    async fn token_taken(&self, token: &str, exclude_id: Option<i64>) -> Result<bool>;
    /// Deactivate the subscriber owning `token`
    async fn unsubscribe(&self, token: &str) -> Result<Option<NewsletterSubscriber>>;
}

#[async_trait]
pub trait ContactSubmissionRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<ContactSubmission>, i64)>;
    async fn get_by_id(&self, id: i64) -> Result<Option<ContactSubmission>>;
    async fn create(&self, input: &ContactSubmissionInput) -> Result<ContactSubmission>;
    async fn update(
        &self,
        id: i64,
        input: &ContactSubmissionInput,
    ) -> Result<Option<ContactSubmission>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn set_processed(&self, ids: &[i64], processed: bool) -> Result<u64>;
}

#[async_trait]
pub trait ToolSubmissionRepository: Send + Sync {
    async fn list(&self, query: &ListSql) -> Result<(Vec<ToolSubmission>, i64)>;
    async fn get_by_id(&self, id: i64) -> Result<Option<ToolSubmission>>;
    async fn create(&self, input: &ToolSubmissionInput) -> Result<ToolSubmission>;
    async fn update(&self, id: i64, input: &ToolSubmissionInput) -> Result<Option<ToolSubmission>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn set_processed(&self, ids: &[i64], processed: bool) -> Result<u64>;
}

pub struct SqlxNewsletterSubscriberRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsletterSubscriberRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsletterSubscriberRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsletterSubscriberRepository for SqlxNewsletterSubscriberRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<NewsletterSubscriber>, i64)> {
        common::fetch_page(&self.pool, query, SUBSCRIBER_COLUMNS).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<NewsletterSubscriber>> {
        common::fetch_by_id(&self.pool, "newsletter_subscribers", SUBSCRIBER_COLUMNS, id).await
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<NewsletterSubscriber>> {
        let sql = format!(
            "SELECT {} FROM newsletter_subscribers WHERE unsubscribe_token = ?",
            SUBSCRIBER_COLUMNS
        );
        with_pool!(self.pool, |conn, Db| {
            sqlx::query_as::<Db, NewsletterSubscriber>(&sql)
                .bind(token)
                .fetch_optional(conn)
                .await
                .context("Failed to get subscriber by token")
        })
    }

    async fn create(&self, input: &NewsletterSubscriberInput) -> Result<NewsletterSubscriber> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO newsletter_subscribers (email, name, subscribed_at, is_active, unsubscribe_token) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&input.email)
            .bind(&input.name)
            .bind(Utc::now())
            .bind(input.is_active)
            .bind(&input.unsubscribe_token)
            .execute(conn)
            .await
            .context("Failed to create subscriber")?
            .inserted_id()
        });
        self.get_by_id(id)
            .await?
            .context("Subscriber missing after insert")
    }

    async fn update(
        &self,
        id: i64,
        input: &NewsletterSubscriberInput,
    ) -> Result<Option<NewsletterSubscriber>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE newsletter_subscribers SET email = ?, name = ?, is_active = ?, unsubscribe_token = ? WHERE id = ?",
            )
            .bind(&input.email)
            .bind(&input.name)
            .bind(input.is_active)
            .bind(&input.unsubscribe_token)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update subscriber")?
            .rows_affected()
        });
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, "newsletter_subscribers", id).await
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        common::value_taken(&self.pool, "newsletter_subscribers", "email", email, exclude_id).await
    }

    async fn token_taken(&self, token: &str, exclude_id: Option<i64>) -> Result<bool> {
        common::value_taken(
            &self.pool,
            "newsletter_subscribers",
            "unsubscribe_token",
            token,
            exclude_id,
        )
        .await
    }

    async fn unsubscribe(&self, token: &str) -> Result<Option<NewsletterSubscriber>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query("UPDATE newsletter_subscribers SET is_active = ? WHERE unsubscribe_token = ?")
                .bind(false)
                .bind(token)
                .execute(conn)
                .await
                .context("Failed to unsubscribe")?
                .rows_affected()
        });
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_token(token).await
    }
}

pub struct SqlxContactSubmissionRepository {
    pool: DynDatabasePool,
}

impl SqlxContactSubmissionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactSubmissionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactSubmissionRepository for SqlxContactSubmissionRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<ContactSubmission>, i64)> {
        common::fetch_page(&self.pool, query, CONTACT_COLUMNS).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactSubmission>> {
        common::fetch_by_id(&self.pool, "contact_submissions", CONTACT_COLUMNS, id).await
    }

    async fn create(&self, input: &ContactSubmissionInput) -> Result<ContactSubmission> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO contact_submissions (name, email, subject, message, submitted_at, is_processed) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.subject)
            .bind(&input.message)
            .bind(Utc::now())
            .bind(input.is_processed)
            .execute(conn)
            .await
            .context("Failed to create contact submission")?
            .inserted_id()
        });
        self.get_by_id(id)
            .await?
            .context("Contact submission missing after insert")
    }

    async fn update(
        &self,
        id: i64,
        input: &ContactSubmissionInput,
    ) -> Result<Option<ContactSubmission>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE contact_submissions SET name = ?, email = ?, subject = ?, message = ?, is_processed = ? WHERE id = ?",
            )
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.subject)
            .bind(&input.message)
            .bind(input.is_processed)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update contact submission")?
            .rows_affected()
        });
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, "contact_submissions", id).await
    }

    async fn set_processed(&self, ids: &[i64], processed: bool) -> Result<u64> {
        common::set_flag(&self.pool, "contact_submissions", "is_processed", processed, ids).await
    }
}

pub struct SqlxToolSubmissionRepository {
    pool: DynDatabasePool,
}

impl SqlxToolSubmissionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ToolSubmissionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ToolSubmissionRepository for SqlxToolSubmissionRepository {
    async fn list(&self, query: &ListSql) -> Result<(Vec<ToolSubmission>, i64)> {
        common::fetch_page(&self.pool, query, SUBMISSION_COLUMNS).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ToolSubmission>> {
        common::fetch_by_id(&self.pool, "tool_submissions", SUBMISSION_COLUMNS, id).await
    }

    async fn create(&self, input: &ToolSubmissionInput) -> Result<ToolSubmission> {
        let id = with_pool!(self.pool, |conn| {
            sqlx::query(
                "INSERT INTO tool_submissions (tool_name, tool_url, description, submitted_by, submitted_at, is_processed) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.tool_name)
            .bind(&input.tool_url)
            .bind(&input.description)
            .bind(input.submitted_by)
            .bind(Utc::now())
            .bind(input.is_processed)
            .execute(conn)
            .await
            .context("Failed to create tool submission")?
            .inserted_id()
        });
        self.get_by_id(id)
            .await?
            .context("Tool submission missing after insert")
    }

    async fn update(&self, id: i64, input: &ToolSubmissionInput) -> Result<Option<ToolSubmission>> {
        let affected = with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE tool_submissions SET tool_name = ?, tool_url = ?, description = ?, submitted_by = ?, \
                 is_processed = ? WHERE id = ?",
            )
            .bind(&input.tool_name)
            .bind(&input.tool_url)
            .bind(&input.description)
            .bind(input.submitted_by)
            .bind(input.is_processed)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update tool submission")?
            .rows_affected()
        });
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        common::delete_by_id(&self.pool, "tool_submissions", id).await
    }

    async fn set_processed(&self, ids: &[i64], processed: bool) -> Result<u64> {
        common::set_flag(&self.pool, "tool_submissions", "is_processed", processed, ids).await
    }
}
