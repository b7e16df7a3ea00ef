//! Theme engine error types

use thiserror::Error;

/// Theme-specific errors
#[derive(Debug, Error)]
pub enum ThemeError {
    /// Template loading or rendering error
    #[error("Template error: {0}")]
    TemplateError(String),

    /// IO error while reading theme overrides
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
