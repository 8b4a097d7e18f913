/// Configuration management for Blog Service
///
/// Settings are read from environment variables (a `.env` file is honoured by
/// `main`) with development-friendly defaults. Production refuses to start
/// with the built-in session secret.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Secret used when `SESSION_SECRET` is not set outside production
const DEV_SESSION_SECRET: &str = "quill-development-session-secret-change-me";
const MIN_SESSION_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage backend and database configuration
    pub database: DatabaseConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
    /// Uploaded media configuration
    pub media: MediaConfig,
    /// Listing page size
    pub pagination: PaginationConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of actix workers
    pub workers: usize,
    /// `text` or `json` log output
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Database URL
    pub url: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &"[REDACTED]")
            .finish()
    }
}

/// Session cookie configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_hours: i64,
    pub secure_cookie: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl_hours", &self.ttl_hours)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// Uploaded media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub posts_per_page: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("BLOG_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("BLOG_SERVICE_PORT", 8000)?,
                workers: parse_env_or_default("HTTP_WORKERS", 4)?,
                log_format: match std::env::var("LOG_FORMAT") {
                    Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
                    Ok(value) if value.eq_ignore_ascii_case("text") => LogFormat::Text,
                    Ok(value) => {
                        return Err(format!("LOG_FORMAT must be 'text' or 'json', got '{}'", value))
                    }
                    Err(_) => LogFormat::Text,
                },
            },
            database: DatabaseConfig {
                backend: match std::env::var("STORAGE_BACKEND") {
                    Ok(value) if value.eq_ignore_ascii_case("memory") => StorageBackend::Memory,
                    Ok(value) if value.eq_ignore_ascii_case("postgres") => {
                        StorageBackend::Postgres
                    }
                    Ok(value) => {
                        return Err(format!(
                            "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                            value
                        ))
                    }
                    Err(_) => StorageBackend::Postgres,
                },
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/quill".to_string()),
            },
            session: {
                let secret = match std::env::var("SESSION_SECRET") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("SESSION_SECRET must be set in production".to_string())
                    }
                    Err(_) => DEV_SESSION_SECRET.to_string(),
                };

                if secret.len() < MIN_SESSION_SECRET_LEN {
                    return Err(format!(
                        "SESSION_SECRET must be at least {} bytes",
                        MIN_SESSION_SECRET_LEN
                    ));
                }

                SessionConfig {
                    secret,
                    ttl_hours: parse_env_or_default("SESSION_TTL_HOURS", 24 * 14)?,
                    secure_cookie: parse_env_or_default("SESSION_COOKIE_SECURE", production)?,
                }
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./media")),
                max_upload_bytes: parse_env_or_default("MEDIA_MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            },
            pagination: {
                let posts_per_page: i64 = parse_env_or_default("POSTS_PER_PAGE", 10)?;
                if posts_per_page < 1 {
                    return Err("POSTS_PER_PAGE must be at least 1".to_string());
                }
                PaginationConfig { posts_per_page }
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "APP_ENV",
        "BLOG_SERVICE_PORT",
        "STORAGE_BACKEND",
        "SESSION_SECRET",
        "SESSION_COOKIE_SECURE",
        "POSTS_PER_PAGE",
        "LOG_FORMAT",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial_test::serial]
    fn defaults_for_development() {
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.database.backend, StorageBackend::Postgres);
        assert_eq!(config.pagination.posts_per_page, 10);
        assert_eq!(config.app.log_format, LogFormat::Text);
        assert!(!config.session.secure_cookie);
        assert!(!config.is_production());
    }

    #[test]
    #[serial_test::serial]
    fn production_requires_session_secret() {
        clear_env();
        std::env::set_var("APP_ENV", "production");

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("SESSION_SECRET"));

        std::env::set_var("SESSION_SECRET", "x".repeat(48));
        let config = Config::from_env().unwrap();
        assert!(config.session.secure_cookie);

        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn rejects_bad_values() {
        clear_env();

        std::env::set_var("POSTS_PER_PAGE", "0");
        assert!(Config::from_env().is_err());
        std::env::set_var("POSTS_PER_PAGE", "ten");
        assert!(Config::from_env().is_err());
        std::env::remove_var("POSTS_PER_PAGE");

        std::env::set_var("STORAGE_BACKEND", "sqlite");
        assert!(Config::from_env().is_err());
        std::env::set_var("STORAGE_BACKEND", "memory");
        assert_eq!(
            Config::from_env().unwrap().database.backend,
            StorageBackend::Memory
        );

        std::env::set_var("SESSION_SECRET", "short");
        assert!(Config::from_env().is_err());

        clear_env();
    }

    #[test]
    fn debug_output_hides_secrets() {
        let session = SessionConfig {
            secret: "super-secret-value".to_string(),
            ttl_hours: 1,
            secure_cookie: false,
        };
        assert!(!format!("{:?}", session).contains("super-secret-value"));
    }
}
