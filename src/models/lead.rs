//! Lead-capture records: newsletter signups, contact messages and tool
//! submissions from visitors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newsletter signup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsletterSubscriber {
    pub id: i64,
    /// Email address (unique)
    pub email: String,
    pub name: String,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
    /// Token for one-click unsubscribe links (unique)
    pub unsubscribe_token: String,
}

/// Writable subscriber fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsletterSubscriberInput {
    pub email: String,
    pub name: String,
    pub is_active: bool,
    /// Generated when blank
    pub unsubscribe_token: String,
}

impl Default for NewsletterSubscriberInput {
    fn default() -> Self {
        Self {
            email: String::new(),
            name: String::new(),
            is_active: true,
            unsubscribe_token: String::new(),
        }
    }
}

impl From<&NewsletterSubscriber> for NewsletterSubscriberInput {
    fn from(subscriber: &NewsletterSubscriber) -> Self {
        Self {
            email: subscriber.email.clone(),
            name: subscriber.name.clone(),
            is_active: subscriber.is_active,
            unsubscribe_token: subscriber.unsubscribe_token.clone(),
        }
    }
}

/// Message sent through the contact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactSubmission {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
    pub is_processed: bool,
}

/// Writable contact submission fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSubmissionInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_processed: bool,
}

impl From<&ContactSubmission> for ContactSubmissionInput {
    fn from(contact: &ContactSubmission) -> Self {
        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
            subject: contact.subject.clone(),
            message: contact.message.clone(),
            is_processed: contact.is_processed,
        }
    }
}

/// A tool suggested by a visitor for the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ToolSubmission {
    pub id: i64,
    pub tool_name: String,
    pub tool_url: String,
    pub description: String,
    pub submitted_by: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub is_processed: bool,
}

/// Writable tool submission fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSubmissionInput {
    pub tool_name: String,
    pub tool_url: String,
    pub description: String,
    pub submitted_by: Option<i64>,
    pub is_processed: bool,
}

impl From<&ToolSubmission> for ToolSubmissionInput {
    fn from(submission: &ToolSubmission) -> Self {
        Self {
            tool_name: submission.tool_name.clone(),
            tool_url: submission.tool_url.clone(),
            description: submission.description.clone(),
            submitted_by: submission.submitted_by,
            is_processed: submission.is_processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_defaults_to_active() {
        let input: NewsletterSubscriberInput =
            serde_json::from_value(serde_json::json!({"email": "a@example.com"})).unwrap();
        assert!(input.is_active);
        assert!(input.unsubscribe_token.is_empty());
    }
}
