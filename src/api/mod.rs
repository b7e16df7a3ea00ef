//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints of the directory:
//! - Homepage (`/`)
//! - Resource CRUD endpoints (`/api/{resource}`)
//! - Auth endpoints (`/api/auth/...`)
//! - Upload endpoints (`/api/uploads/{kind}`)
//! - Admin console endpoints (`/admin/api/...`)
//! - Uploaded media (`/media/...`)

pub mod admin;
pub mod auth;
pub mod common;
pub mod home;
pub mod middleware;
pub mod resources;
pub mod upload;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Staff routes (need a staff or admin session)
    let staff_routes = Router::new()
        .nest("/uploads", upload::router(state.upload_config.max_file_size))
        .route_layer(axum_middleware::from_fn(middleware::require_staff))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need any session)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .merge(resources::router())
        .merge(staff_routes)
        .merge(protected_routes)
}

/// Build the admin console router
pub fn build_admin_router(state: AppState) -> Router<AppState> {
    admin::router()
        .route_layer(axum_middleware::from_fn(middleware::require_staff))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let media = ServeDir::new(&state.upload_config.path);

    let router = Router::new()
        .merge(home::router())
        .nest("/api", build_api_router(state.clone()))
        .merge(build_admin_router(state.clone()))
        .nest_service("/media", media)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let router = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
                .allow_credentials(true),
        ),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}: {}", cors_origin, e);
            router
        }
    };

    router.with_state(state)
}
