//! Theme engine
//!
//! This module provides template rendering using Tera.
//! Features:
//! - Built-in templates embedded in the binary
//! - Per-theme overrides loaded from `<themes_path>/<active>/`
//! - A plain HTML error page for when rendering fails

use rust_embed::RustEmbed;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::ThemeError;

/// Templates compiled into the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct BuiltinTemplates;

/// Theme engine for rendering templates
pub struct ThemeEngine {
    /// Tera template engine instance
    tera: Tera,
    /// Currently active theme name
    active: String,
    /// Directory the active theme was loaded from
    theme_dir: PathBuf,
}

impl ThemeEngine {
    /// Create a theme engine with the built-in templates, overridden by
    /// any `.html` files found under `themes_path/active`.
    ///
    /// A missing theme directory is not an error; the built-in templates
    /// are used as they are.
    pub fn new(themes_path: &Path, active: &str) -> Result<Self, ThemeError> {
        let theme_dir = themes_path.join(active);

        let mut templates = builtin_templates()?;
        if theme_dir.is_dir() {
            let mut overrides = Vec::new();
            collect_templates_from_dir(&theme_dir, &theme_dir, &mut overrides)?;
            tracing::info!(
                "Theme '{}' overrides {} template(s)",
                active,
                overrides.len()
            );
            for (name, content) in overrides {
                templates.retain(|(existing, _)| *existing != name);
                templates.push((name, content));
            }
        } else {
            tracing::debug!(
                "Theme directory {:?} not found, using built-in templates",
                theme_dir
            );
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(error_chain("Failed to load templates", &e)))?;

        Ok(Self {
            tera,
            active: active.to_string(),
            theme_dir,
        })
    }

    /// Name of the active theme
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Directory overrides are read from
    pub fn theme_dir(&self) -> &Path {
        &self.theme_dir
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Render a template
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ThemeError> {
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(error_chain(&format!("Failed to render '{}'", template), &e))
        })
    }

    /// Minimal page shown when a template cannot be rendered
    pub fn error_page(title: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body>
    <h1>{title}</h1>
    <p>The page could not be rendered. Please try again later.</p>
</body>
</html>"#
        )
    }
}

fn builtin_templates() -> Result<Vec<(String, String)>, ThemeError> {
    let mut templates = Vec::new();
    for name in BuiltinTemplates::iter() {
        let Some(file) = BuiltinTemplates::get(&name) else {
            continue;
        };
        let content = std::str::from_utf8(&file.data)
            .map_err(|e| ThemeError::TemplateError(format!("{} is not UTF-8: {}", name, e)))?
            .to_string();
        templates.push((name.to_string(), content));
    }
    Ok(templates)
}

/// Collect `.html` files below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<(), ThemeError> {
    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;
            let name = relative_path.to_string_lossy().replace('\\', "/");
            templates.push((name, fs::read_to_string(&path)?));
        }
    }
    Ok(())
}

fn error_chain(prefix: &str, e: &tera::Error) -> String {
    let mut message = format!("{}: {}", prefix, e);
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

#[cfg(test)]
mod tests;
