//! User service
//!
//! Sign-in for the admin console:
//! - Login with username and password, returning a session token
//! - Logout and session validation (expired sessions are removed on sight)
//! - Bootstrapping the configured admin account at startup
//!
//! There is no public registration; accounts come from the bootstrap or
//! from an operator inserting them.

use crate::config::AdminConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// User service for accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
        }
    }

    /// Create an account with a freshly hashed password
    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }
        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(input.username));
        }

        let hash = hash_password(&input.password)?;
        let user = User::new(input.username, input.email, hash, input.role);
        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;
        Ok(created)
    }

    /// Create the configured admin account unless the username exists.
    ///
    /// Returns the new account, or `None` when nothing was created.
    pub async fn bootstrap_admin(&self, config: &AdminConfig) -> Result<Option<User>, UserServiceError> {
        if self
            .user_repo
            .get_by_username(&config.username)
            .await
            .context("Failed to look up admin account")?
            .is_some()
        {
            tracing::debug!("Admin account {} already present", config.username);
            return Ok(None);
        }

        let user = self
            .create_user(CreateUserInput {
                username: config.username.clone(),
                email: config.email.clone(),
                password: config.password.clone(),
                role: UserRole::Admin,
            })
            .await?;
        tracing::info!("Created admin account {}", user.username);
        Ok(Some(user))
    }

    /// Check credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> Result<(Session, User), UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?
            .ok_or_else(|| UserServiceError::AuthenticationError(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password_hash).context("Failed to verify password")? {
            tracing::warn!("Failed login for {}", username);
            return Err(UserServiceError::AuthenticationError(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        let session = self
            .session_repo
            .create(&Session::start(user.id))
            .await
            .context("Failed to create session")?;
        Ok((session, user))
    }

    /// Delete the session; unknown tokens are ignored
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// The user behind a live session token
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to remove expired session: {}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    /// Delete every expired session; returns how many went
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }
}
