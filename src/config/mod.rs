//! Configuration management
//!
//! Configuration is read from `config.yml` and may be overridden by
//! `TOOLHUB_*` environment variables. Missing values fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Theme configuration
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Admin account created at startup when absent
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/toolhub.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// In-process cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_ttl() -> u64 {
    3600
}

/// Theme configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Active theme name
    #[serde(default = "default_theme")]
    pub active: String,
    /// Path to themes directory
    #[serde(default = "default_theme_path")]
    pub path: PathBuf,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            active: default_theme(),
            path: default_theme_path(),
        }
    }
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_theme_path() -> PathBuf {
    PathBuf::from("themes")
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Media root directory
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("media")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/svg+xml".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }
}

/// Bootstrap administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration. Invalid YAML
    /// is reported with its line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognized variables:
    /// - TOOLHUB_SERVER_HOST, TOOLHUB_SERVER_PORT, TOOLHUB_SERVER_CORS_ORIGIN
    /// - TOOLHUB_DATABASE_DRIVER, TOOLHUB_DATABASE_URL
    /// - TOOLHUB_CACHE_MAX_CAPACITY, TOOLHUB_CACHE_TTL_SECONDS
    /// - TOOLHUB_THEME_ACTIVE, TOOLHUB_THEME_PATH
    /// - TOOLHUB_UPLOAD_PATH
    /// - TOOLHUB_ADMIN_USERNAME, TOOLHUB_ADMIN_EMAIL, TOOLHUB_ADMIN_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("TOOLHUB_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("TOOLHUB_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("TOOLHUB_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("TOOLHUB_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("TOOLHUB_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(capacity) = std::env::var("TOOLHUB_CACHE_MAX_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<u64>() {
                self.cache.max_capacity = capacity;
            }
        }
        if let Ok(ttl) = std::env::var("TOOLHUB_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(active) = std::env::var("TOOLHUB_THEME_ACTIVE") {
            self.theme.active = active;
        }
        if let Ok(path) = std::env::var("TOOLHUB_THEME_PATH") {
            self.theme.path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("TOOLHUB_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }

        // The password is what turns the admin section on.
        if let Ok(password) = std::env::var("TOOLHUB_ADMIN_PASSWORD") {
            let admin = self.admin.get_or_insert_with(|| AdminConfig {
                username: default_admin_username(),
                email: String::new(),
                password: String::new(),
            });
            admin.password = password;
        }
        if let Some(admin) = self.admin.as_mut() {
            if let Ok(username) = std::env::var("TOOLHUB_ADMIN_USERNAME") {
                admin.username = username;
            }
            if let Ok(email) = std::env::var("TOOLHUB_ADMIN_EMAIL") {
                admin.email = email;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches TOOLHUB_* variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_VARS: &[&str] = &[
    "TOOLHUB_SERVER_HOST",
    "TOOLHUB_SERVER_PORT",
    "TOOLHUB_SERVER_CORS_ORIGIN",
    "TOOLHUB_DATABASE_DRIVER",
    "TOOLHUB_DATABASE_URL",
    "TOOLHUB_CACHE_MAX_CAPACITY",
    "TOOLHUB_CACHE_TTL_SECONDS",
    "TOOLHUB_THEME_ACTIVE",
    "TOOLHUB_THEME_PATH",
    "TOOLHUB_UPLOAD_PATH",
    "TOOLHUB_ADMIN_USERNAME",
    "TOOLHUB_ADMIN_EMAIL",
    "TOOLHUB_ADMIN_PASSWORD",
];

#[cfg(test)]
fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_host_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255)
                .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d)),
            Just("localhost".to_string()),
            "[a-z][a-z0-9]{0,10}",
        ]
    }

    fn driver_strategy() -> impl Strategy<Value = DatabaseDriver> {
        prop_oneof![Just(DatabaseDriver::Sqlite), Just(DatabaseDriver::Mysql)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Serializing a config and parsing it back yields the same values.
        #[test]
        fn config_yaml_roundtrip(
            host in valid_host_strategy(),
            port in 1u16..=65535,
            driver in driver_strategy(),
            ttl in 1u64..=86400,
            capacity in 1u64..=1_000_000,
        ) {
            let mut config = Config::default();
            config.server.host = host.clone();
            config.server.port = port;
            config.database.driver = driver;
            config.cache.ttl_seconds = ttl;
            config.cache.max_capacity = capacity;

            let yaml = serde_yaml::to_string(&config).unwrap();
            let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

            prop_assert_eq!(parsed.server.host, host);
            prop_assert_eq!(parsed.server.port, port);
            prop_assert_eq!(parsed.database.driver, driver);
            prop_assert_eq!(parsed.cache.ttl_seconds, ttl);
            prop_assert_eq!(parsed.cache.max_capacity, capacity);
        }

        /// A file naming only the port keeps every other default.
        #[test]
        fn partial_config_keeps_defaults(port in 1u16..=65535) {
            let yaml = format!("server:\n  port: {}\n", port);
            let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
            prop_assert_eq!(parsed.server.port, port);
            prop_assert_eq!(parsed.server.host, "0.0.0.0");
            prop_assert_eq!(parsed.cache.ttl_seconds, 3600);
        }
    }
}
