//! Tests for the theme engine

use super::*;
use std::fs;
use tempfile::TempDir;
use tera::Context as TeraContext;

fn empty_home_context() -> TeraContext {
    let mut context = TeraContext::new();
    let empty: Vec<serde_json::Value> = Vec::new();
    for key in [
        "categories",
        "featured_tools",
        "latest_tools",
        "stats",
        "articles",
        "all_tools",
    ] {
        context.insert(key, &empty);
    }
    context
}

#[test]
fn test_builtin_templates_without_theme_dir() {
    let temp_dir = TempDir::new().unwrap();
    let engine = ThemeEngine::new(temp_dir.path(), "default").unwrap();

    assert_eq!(engine.active(), "default");
    assert!(engine.has_template("base.html"));
    assert!(engine.has_template("index.html"));

    let html = engine.render("index.html", &empty_home_context()).unwrap();
    assert!(html.contains("No categories yet."));
    assert!(html.contains("<title>ToolHub</title>"));
}

#[test]
fn test_builtin_index_renders_tools() {
    let temp_dir = TempDir::new().unwrap();
    let engine = ThemeEngine::new(temp_dir.path(), "default").unwrap();

    let mut context = empty_home_context();
    let tool = serde_json::json!({
        "name": "Scribe",
        "website_url": "https://scribe.example",
        "pricing_type": "freemium",
        "short_description": "Writes things",
        "logo": null,
        "logo_url": "https://cdn.example/scribe.png",
    });
    context.insert("featured_tools", &vec![tool.clone()]);
    context.insert("all_tools", &vec![tool]);

    let html = engine.render("index.html", &context).unwrap();
    assert!(html.contains("Scribe"));
    assert!(html.contains("https://cdn.example/scribe.png"));
    assert!(!html.contains("No featured tools yet."));
}

#[test]
fn test_theme_dir_overrides_builtin() {
    let temp_dir = TempDir::new().unwrap();
    let theme_dir = temp_dir.path().join("dark");
    fs::create_dir_all(theme_dir.join("partials")).unwrap();
    fs::write(
        theme_dir.join("index.html"),
        r#"{% extends "base.html" %}{% block title %}Dark{% endblock %}{% block content %}{{ all_tools | length }} tools{% endblock %}"#,
    )
    .unwrap();
    fs::write(theme_dir.join("partials/footer.html"), "footer").unwrap();

    let engine = ThemeEngine::new(temp_dir.path(), "dark").unwrap();
    assert!(engine.has_template("partials/footer.html"));

    let html = engine.render("index.html", &empty_home_context()).unwrap();
    assert!(html.contains("<title>Dark</title>"));
    assert!(html.contains("0 tools"));
}

#[test]
fn test_render_error_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let engine = ThemeEngine::new(temp_dir.path(), "default").unwrap();

    let err = engine
        .render("index.html", &TeraContext::new())
        .unwrap_err();
    assert!(matches!(err, ThemeError::TemplateError(_)));
    assert!(err.to_string().contains("index.html"));

    assert!(engine.render("missing.html", &TeraContext::new()).is_err());
}

#[test]
fn test_broken_override_fails_to_load() {
    let temp_dir = TempDir::new().unwrap();
    let theme_dir = temp_dir.path().join("broken");
    fs::create_dir_all(&theme_dir).unwrap();
    fs::write(theme_dir.join("index.html"), "{% if %}").unwrap();

    assert!(ThemeEngine::new(temp_dir.path(), "broken").is_err());
}

#[test]
fn test_error_page_is_plain_html() {
    let page = ThemeEngine::error_page("Server Error");
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<h1>Server Error</h1>"));
}
