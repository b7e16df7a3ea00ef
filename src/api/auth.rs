//! Authentication API endpoints
//!
//! Handles HTTP requests for console sign-in:
//! - POST /api/auth/login - User login
//! - POST /api/auth/logout - User logout
//! - GET /api/auth/me - Get current user

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::JsonBody;
use crate::api::middleware::{
    extract_session_token, ApiError, AppState, AuthenticatedUser, SESSION_COOKIE,
};
use crate::models::{User, SESSION_LIFETIME_DAYS};

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

fn session_cookie(token: &str, max_age: i64) -> Result<HeaderValue, ApiError> {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );
    HeaderValue::from_str(&cookie).map_err(|e| {
        tracing::error!("Invalid session cookie: {}", e);
        ApiError::internal_error("Internal server error")
    })
}

/// POST /api/auth/login - User login
async fn login(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let body: LoginRequest = body.decode()?;

    let (session, user) = state
        .services
        .users
        .login(&body.username, &body.password)
        .await?;
    tracing::info!("User {} logged in", user.username);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&session.id, SESSION_LIFETIME_DAYS * 24 * 60 * 60)?,
    );

    Ok((
        headers,
        Json(AuthResponse {
            token: session.id,
            user,
        }),
    ))
}

/// POST /api/auth/logout - User logout
async fn logout(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&request_headers) {
        state.services.users.logout(&token).await?;
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie("", 0)?);
    Ok((StatusCode::NO_CONTENT, headers))
}

/// GET /api/auth/me - Get current user
async fn get_current_user(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
