//! Homepage
//!
//! `GET /` renders `index.html` with the cached [`HomeContext`].

use axum::{extract::State, http::StatusCode, response::Html, routing::get, Router};
use tera::Context as TeraContext;

use crate::api::middleware::AppState;
use crate::services::HomeContext;
use crate::theme::ThemeEngine;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    let context = match state.services.home.context().await {
        Ok(context) => context,
        Err(e) => {
            tracing::error!("Failed to build homepage context: {}", e);
            return server_error();
        }
    };

    match render_home(&state.theme, &context) {
        Ok(html) => (StatusCode::OK, Html(html)),
        Err(e) => {
            tracing::warn!("Falling back to error page: {}", e);
            server_error()
        }
    }
}

fn render_home(theme: &ThemeEngine, context: &HomeContext) -> anyhow::Result<String> {
    let context = TeraContext::from_serialize(context)?;
    Ok(theme.render("index.html", &context)?)
}

fn server_error() -> (StatusCode, Html<String>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(ThemeEngine::error_page("Server Error")),
    )
}
