//! Cafe API configuration module.
//!
//! Configuration is layered: built-in defaults, then an optional
//! `cafe-api.toml` next to the binary, then `CAFE_*` environment variables.
//!
//! | Key                        | Env                              | Default             |
//! |----------------------------|----------------------------------|---------------------|
//! | `port`                     | `CAFE_PORT`                      | 8080                |
//! | `database_path`            | `CAFE_DATABASE_PATH`             | `./cafe.db`         |
//! | `jwt_secret`               | `CAFE_JWT_SECRET`                | dev secret          |
//! | `token_lifetime_secs`      | `CAFE_TOKEN_LIFETIME_SECS`       | 43200 (12 h)        |
//! | `public_api_key`           | `CAFE_PUBLIC_API_KEY`            | dev key             |
//! | `cors_origins`             | `CAFE_CORS_ORIGINS` (comma list) | empty = any origin  |
//! | `bootstrap_admin_password` | `CAFE_BOOTSTRAP_ADMIN_PASSWORD`  | unset               |
//! | `log_json`                 | `CAFE_LOG_JSON`                  | false               |

use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "cafe-dev-secret-change-in-production";
const DEV_PUBLIC_API_KEY: &str = "cafe-public-dev-key";

/// Cafe API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Secret for signing bearer tokens
    pub jwt_secret: String,

    /// Bearer token lifetime in seconds
    pub token_lifetime_secs: i64,

    /// Shared key the public order page sends with createOrder / newsletter
    pub public_api_key: String,

    /// Allowed browser origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Password for the `admin` account created on an empty users table
    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl ApiConfig {
    /// Load configuration from defaults, `cafe-api.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("port", 8080_i64)?
            .set_default("database_path", "./cafe.db")?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("token_lifetime_secs", 43_200_i64)?
            .set_default("public_api_key", DEV_PUBLIC_API_KEY)?
            .set_default("log_json", false)?
            .add_source(config::File::with_name("cafe-api").required(false))
            .add_source(
                config::Environment::with_prefix("CAFE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()?;

        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().len() < 16 {
            return Err(ConfigError::InvalidValue(
                "jwt_secret (at least 16 characters)".to_string(),
            ));
        }
        if self.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("token_lifetime_secs".to_string()));
        }
        if self.public_api_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired("public_api_key".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        Ok(())
    }

    /// True when the server still runs on the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Fixed configuration for router tests: in-memory database, known keys.
    pub fn for_tests() -> Self {
        ApiConfig {
            port: 0,
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret-at-least-16-chars".to_string(),
            token_lifetime_secs: 3600,
            public_api_key: "test-public-key".to_string(),
            cors_origins: Vec::new(),
            bootstrap_admin_password: Some("admin-pass".to_string()),
            log_json: false,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}
