//! Services for inbound visitor data: newsletter signups, contact messages
//! and tool suggestions

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::resource::{Invalidator, Resource};
use super::validation::Validator;
use super::ServiceError;
use crate::db::repositories::{
    ContactSubmissionRepository, NewsletterSubscriberRepository, ToolSubmissionRepository,
};
use crate::db::{DynDatabasePool, FilterField, FilterKind, ListQuery, ListSpec, Page};
use crate::models::{
    ContactSubmission, ContactSubmissionInput, NewsletterSubscriber, NewsletterSubscriberInput,
    ToolSubmission, ToolSubmissionInput,
};

pub const MARK_PROCESSED: &str = "mark_as_processed";
pub const MARK_UNPROCESSED: &str = "mark_as_unprocessed";

pub static NEWSLETTER_LIST: ListSpec = ListSpec {
    table: "newsletter_subscribers",
    search: &["email", "name"],
    filters: &[
        FilterField {
            param: "is_active",
            kind: FilterKind::Bool("is_active"),
        },
        FilterField {
            param: "subscribed_at",
            kind: FilterKind::Date("subscribed_at"),
        },
    ],
    ordering: &["email", "subscribed_at"],
    default_order: "subscribed_at DESC",
};

pub static CONTACT_LIST: ListSpec = ListSpec {
    table: "contact_submissions",
    search: &["name", "email", "subject", "message"],
    filters: &[
        FilterField {
            param: "is_processed",
            kind: FilterKind::Bool("is_processed"),
        },
        FilterField {
            param: "submitted_at",
            kind: FilterKind::Date("submitted_at"),
        },
    ],
    ordering: &["submitted_at", "name"],
    default_order: "submitted_at DESC",
};

pub static TOOL_SUBMISSION_LIST: ListSpec = ListSpec {
    table: "tool_submissions",
    search: &["tool_name", "tool_url", "description"],
    filters: &[
        FilterField {
            param: "is_processed",
            kind: FilterKind::Bool("is_processed"),
        },
        FilterField {
            param: "submitted_at",
            kind: FilterKind::Date("submitted_at"),
        },
    ],
    ordering: &["submitted_at", "tool_name"],
    default_order: "submitted_at DESC",
};

/// Newsletter subscriber service
pub struct NewsletterService {
    repo: Arc<dyn NewsletterSubscriberRepository>,
    invalidator: Invalidator,
}

impl NewsletterService {
    pub fn new(repo: Arc<dyn NewsletterSubscriberRepository>, invalidator: Invalidator) -> Self {
        Self { repo, invalidator }
    }

    /// Deactivate the subscriber holding `token`
    pub async fn unsubscribe(&self, token: &str) -> Result<NewsletterSubscriber, ServiceError> {
        let subscriber = match self.repo.unsubscribe(token).await? {
            Some(subscriber) => subscriber,
            // Already inactive rows report no change on MySQL
            None => self
                .repo
                .get_by_token(token)
                .await?
                .ok_or_else(|| ServiceError::not_found("Subscriber"))?,
        };
        tracing::info!("Subscriber {} unsubscribed", subscriber.id);
        self.invalidator.invalidate("newsletter").await;
        Ok(subscriber)
    }

    async fn fresh_token(&self) -> Result<String, ServiceError> {
        loop {
            let token = Uuid::new_v4().simple().to_string();
            if !self.repo.token_taken(&token, None).await? {
                return Ok(token);
            }
        }
    }

    async fn validate(
        &self,
        input: &mut NewsletterSubscriberInput,
        existing: Option<&NewsletterSubscriber>,
    ) -> Result<(), ServiceError> {
        let id = existing.map(|s| s.id);
        let mut v = Validator::new();
        v.email("email", &input.email)
            .max_chars("name", &input.name, 100)
            .max_chars("unsubscribe_token", &input.unsubscribe_token, 50);

        if !v.has("email") && self.repo.email_taken(&input.email, id).await? {
            v.add("email", "newsletter subscriber with this email already exists.");
        }

        input.unsubscribe_token = input.unsubscribe_token.trim().to_string();
        if input.unsubscribe_token.is_empty() {
            input.unsubscribe_token = match existing {
                Some(current) => current.unsubscribe_token.clone(),
                None => self.fresh_token().await?,
            };
        } else if !v.has("unsubscribe_token")
            && self.repo.token_taken(&input.unsubscribe_token, id).await?
        {
            v.add(
                "unsubscribe_token",
                "newsletter subscriber with this unsubscribe token already exists.",
            );
        }

        v.finish()
    }
}

#[async_trait]
impl Resource for NewsletterService {
    type Repr = NewsletterSubscriber;
    type Input = NewsletterSubscriberInput;

    fn name(&self) -> &'static str {
        "newsletter-subscribers"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &NEWSLETTER_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<NewsletterSubscriber>, ServiceError> {
        let sql = query.compile(&NEWSLETTER_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<NewsletterSubscriber, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Subscriber"))
    }

    async fn create(
        &self,
        mut input: NewsletterSubscriberInput,
    ) -> Result<NewsletterSubscriber, ServiceError> {
        self.validate(&mut input, None).await?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate("newsletter").await;
        Ok(created)
    }

    async fn check_update(
        &self,
        id: i64,
        mut input: NewsletterSubscriberInput,
    ) -> Result<(), ServiceError> {
        let current = self.get(id).await?;
        self.validate(&mut input, Some(&current)).await
    }

    async fn update(
        &self,
        id: i64,
        mut input: NewsletterSubscriberInput,
    ) -> Result<NewsletterSubscriber, ServiceError> {
        let current = self.get(id).await?;
        self.validate(&mut input, Some(&current)).await?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Subscriber"))?;
        self.invalidator.invalidate("newsletter").await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Subscriber"));
        }
        self.invalidator.invalidate("newsletter").await;
        Ok(())
    }

    fn input_from(&self, subscriber: &NewsletterSubscriber) -> NewsletterSubscriberInput {
        NewsletterSubscriberInput::from(subscriber)
    }
}

/// Contact form submission service
pub struct ContactService {
    repo: Arc<dyn ContactSubmissionRepository>,
    invalidator: Invalidator,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactSubmissionRepository>, invalidator: Invalidator) -> Self {
        Self { repo, invalidator }
    }

    pub async fn set_processed(&self, ids: &[i64], processed: bool) -> Result<u64, ServiceError> {
        let affected = self.repo.set_processed(ids, processed).await?;
        self.invalidator.invalidate("contact").await;
        Ok(affected)
    }

    fn validate(input: &ContactSubmissionInput) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("name", &input.name, 100)
            .email("email", &input.email)
            .text("subject", &input.subject, 200)
            .required_text("message", &input.message);
        v.finish()
    }
}

#[async_trait]
impl Resource for ContactService {
    type Repr = ContactSubmission;
    type Input = ContactSubmissionInput;

    fn name(&self) -> &'static str {
        "contact-submissions"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &CONTACT_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<ContactSubmission>, ServiceError> {
        let sql = query.compile(&CONTACT_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<ContactSubmission, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contact submission"))
    }

    async fn create(&self, input: ContactSubmissionInput) -> Result<ContactSubmission, ServiceError> {
        Self::validate(&input)?;
        let created = self.repo.create(&input).await?;
        self.invalidator.invalidate("contact").await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, input: ContactSubmissionInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        Self::validate(&input)
    }

    async fn update(
        &self,
        id: i64,
        input: ContactSubmissionInput,
    ) -> Result<ContactSubmission, ServiceError> {
        self.get(id).await?;
        Self::validate(&input)?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contact submission"))?;
        self.invalidator.invalidate("contact").await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Contact submission"));
        }
        self.invalidator.invalidate("contact").await;
        Ok(())
    }

    fn input_from(&self, contact: &ContactSubmission) -> ContactSubmissionInput {
        ContactSubmissionInput::from(contact)
    }

    async fn run_action(&self, action: &str, ids: &[i64]) -> Result<Option<u64>, ServiceError> {
        match action {
            MARK_PROCESSED => self.set_processed(ids, true).await.map(Some),
            MARK_UNPROCESSED => self.set_processed(ids, false).await.map(Some),
            _ => Ok(None),
        }
    }
}

/// Suggested-tool submission service
pub struct ToolSubmissionService {
    repo: Arc<dyn ToolSubmissionRepository>,
    pool: DynDatabasePool,
    invalidator: Invalidator,
}

impl ToolSubmissionService {
    pub fn new(
        repo: Arc<dyn ToolSubmissionRepository>,
        pool: DynDatabasePool,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            repo,
            pool,
            invalidator,
        }
    }

    pub async fn set_processed(&self, ids: &[i64], processed: bool) -> Result<u64, ServiceError> {
        let affected = self.repo.set_processed(ids, processed).await?;
        self.invalidator.invalidate("tool_submission").await;
        Ok(affected)
    }

    async fn validate(&self, input: &ToolSubmissionInput) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.text("tool_name", &input.tool_name, 200)
            .url("tool_url", &input.tool_url, 200)
            .required_text("description", &input.description);
        v.exists_opt(&self.pool, "submitted_by", "users", input.submitted_by)
            .await?;
        v.finish()
    }
}

#[async_trait]
impl Resource for ToolSubmissionService {
    type Repr = ToolSubmission;
    type Input = ToolSubmissionInput;

    fn name(&self) -> &'static str {
        "tool-submissions"
    }

    fn list_spec(&self) -> &'static ListSpec {
        &TOOL_SUBMISSION_LIST
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<ToolSubmission>, ServiceError> {
        let sql = query.compile(&TOOL_SUBMISSION_LIST)?;
        let (items, total) = self.repo.list(&sql).await?;
        Ok(Page::new(items, total, query.page, query.page_size))
    }

    async fn get(&self, id: i64) -> Result<ToolSubmission, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool submission"))
    }

    async fn create(&self, input: ToolSubmissionInput) -> Result<ToolSubmission, ServiceError> {
        self.validate(&input).await?;
        let created = self.repo.create(&input).await?;
        tracing::info!("New tool submission: {}", created.tool_name);
        self.invalidator.invalidate("tool_submission").await;
        Ok(created)
    }

    async fn check_update(&self, id: i64, input: ToolSubmissionInput) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.validate(&input).await
    }

    async fn update(&self, id: i64, input: ToolSubmissionInput) -> Result<ToolSubmission, ServiceError> {
        self.get(id).await?;
        self.validate(&input).await?;
        let updated = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool submission"))?;
        self.invalidator.invalidate("tool_submission").await;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Tool submission"));
        }
        self.invalidator.invalidate("tool_submission").await;
        Ok(())
    }

    fn input_from(&self, submission: &ToolSubmission) -> ToolSubmissionInput {
        ToolSubmissionInput::from(submission)
    }

    async fn run_action(&self, action: &str, ids: &[i64]) -> Result<Option<u64>, ServiceError> {
        match action {
            MARK_PROCESSED => self.set_processed(ids, true).await.map(Some),
            MARK_UNPROCESSED => self.set_processed(ids, false).await.map(Some),
            _ => Ok(None),
        }
    }
}
