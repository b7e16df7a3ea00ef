//! Shared setup for the HTTP integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use toolhub::{
    api::{build_router, AppState},
    cache::create_test_cache,
    config::{AdminConfig, UploadConfig},
    db::{create_test_pool, migrations::run_migrations},
    models::{CreateUserInput, UserRole},
    services::Services,
    theme::ThemeEngine,
};

pub const ADMIN_PASSWORD: &str = "admin-pass-123";

/// A router over a fresh in-memory database, plus the directories it writes to
pub struct TestApp {
    pub router: Router,
    pub services: Services,
    pub media: TempDir,
    _themes: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let services = Services::build(pool, create_test_cache());

        services
            .users
            .bootstrap_admin(&AdminConfig {
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .unwrap();

        let themes = TempDir::new().unwrap();
        let media = TempDir::new().unwrap();
        let theme = ThemeEngine::new(themes.path(), "default").unwrap();
        let upload_config = UploadConfig {
            path: media.path().to_path_buf(),
            ..Default::default()
        };

        let state = AppState {
            services: services.clone(),
            theme: Arc::new(theme),
            upload_config: Arc::new(upload_config),
        };

        Self {
            router: build_router(state, "http://localhost:3000"),
            services,
            media,
            _themes: themes,
        }
    }

    /// Send a request and return the status with the parsed JSON body
    /// (`Value::Null` for an empty body)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), None).await
    }

    /// Log in and return the session token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                serde_json::json!({"username": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }

    /// Token for an account without console access
    pub async fn member_token(&self) -> String {
        self.services
            .users
            .create_user(CreateUserInput {
                username: "member".to_string(),
                email: "member@example.com".to_string(),
                password: "member-pass".to_string(),
                role: UserRole::Member,
            })
            .await
            .unwrap();
        self.login("member", "member-pass").await
    }

    /// Create a category through the API and return its id
    pub async fn category(&self, name: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/categories",
                serde_json::json!({"name": name, "icon": "fa-robot"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }

    /// Create a tool through the API and return its representation
    pub async fn tool(&self, name: &str, category: i64, featured: bool) -> Value {
        let (status, body) = self
            .post(
                "/api/ai-tools",
                serde_json::json!({
                    "name": name,
                    "short_description": format!("{} in one line", name),
                    "long_description": format!("{} at length", name),
                    "website_url": "https://example.com",
                    "pricing_type": "freemium",
                    "categories": [category],
                    "featured": featured,
                    "is_verified": true,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }
}
