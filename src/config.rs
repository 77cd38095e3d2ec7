use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Authentication configuration
    pub jwt_secret: String,

    // Pagination
    pub default_page_size: i64,
    pub max_page_size: i64,

    // Suggestion ranking
    pub suggestion_default_limit: usize,
    pub suggestion_max_limit: usize,
    pub suggestion_fanout_limit: usize,

    // Transient storage error retry
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "aura".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "graph".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),

            default_page_size: env::var("DEFAULT_PAGE_SIZE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            max_page_size: env::var("MAX_PAGE_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            suggestion_default_limit: env::var("SUGGESTION_DEFAULT_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            suggestion_max_limit: env::var("SUGGESTION_MAX_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,
            suggestion_fanout_limit: env::var("SUGGESTION_FANOUT_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,

            retry_max_attempts: env::var("RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            retry_base_delay_ms: env::var("RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

// 测试环境默认使用内存引擎
impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            database_url: "mem://".to_string(),
            database_namespace: "aura".to_string(),
            database_name: "graph".to_string(),
            database_username: String::new(),
            database_password: String::new(),
            jwt_secret: "test-secret".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            suggestion_default_limit: 10,
            suggestion_max_limit: 50,
            suggestion_fanout_limit: 50,
            retry_max_attempts: 3,
            retry_base_delay_ms: 50,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}
