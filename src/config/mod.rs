use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub sheets: SheetsConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Admin credentials and token signing settings. Immutable once loaded.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

// Secrets stay out of logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub credentials_file: PathBuf,
    /// Account granted access to every spreadsheet this service creates
    pub share_with_email: Option<String>,
    pub share_role: String,
    pub sheets_api_base_url: String,
    pub drive_api_base_url: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// `*` allows any origin
    pub cors_origins: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration value {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let auth = AuthConfig::from_lookup(&lookup)?;

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(auth),
            Environment::Staging => Self::staging(auth),
            Environment::Development => Self::development(auth),
        }
        .with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("SHEETS_API_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("SHEETS_API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v
                .parse()
                .map_err(|_| ConfigError::invalid("PORT", &v, "expected a port number"))?;
        }

        // Google overrides
        if let Some(v) = lookup("GOOGLE_CREDENTIALS_FILE") {
            self.sheets.credentials_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("SHARE_WITH_EMAIL") {
            self.sheets.share_with_email = Some(v);
        }
        if let Some(v) = lookup("SHARE_ROLE") {
            self.sheets.share_role = v;
        }
        if let Some(v) = lookup("SHEETS_API_BASE_URL") {
            self.sheets.sheets_api_base_url = v;
        }
        if let Some(v) = lookup("DRIVE_API_BASE_URL") {
            self.sheets.drive_api_base_url = v;
        }
        if let Some(v) = lookup("HTTP_TIMEOUT_SECS") {
            self.sheets.http_timeout_secs = v
                .parse()
                .map_err(|_| ConfigError::invalid("HTTP_TIMEOUT_SECS", &v, "expected seconds"))?;
        }

        // Security overrides
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Production spreadsheets must be reachable by someone besides the service account
        if self.environment == Environment::Production && self.sheets.share_with_email.is_none() {
            return Err(ConfigError::Missing("SHARE_WITH_EMAIL"));
        }

        Ok(self)
    }

    fn development(auth: AuthConfig) -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            auth,
            sheets: SheetsConfig::defaults(30),
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging(auth: AuthConfig) -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            auth,
            sheets: SheetsConfig::defaults(20),
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production(auth: AuthConfig) -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            auth,
            sheets: SheetsConfig::defaults(15),
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

impl AuthConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_username =
            lookup("ADMIN_USERNAME").ok_or(ConfigError::Missing("ADMIN_USERNAME"))?;
        let admin_password =
            lookup("ADMIN_PASSWORD").ok_or(ConfigError::Missing("ADMIN_PASSWORD"))?;
        let secret_key = lookup("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let raw_algorithm = lookup("ALGORITHM").ok_or(ConfigError::Missing("ALGORITHM"))?;
        let algorithm = Algorithm::from_str(raw_algorithm.trim())
            .map_err(|_| ConfigError::invalid("ALGORITHM", &raw_algorithm, "unknown algorithm"))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(ConfigError::invalid(
                "ALGORITHM",
                &raw_algorithm,
                "only HS256, HS384 and HS512 can be keyed by SECRET_KEY",
            ));
        }

        let raw_ttl = lookup("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok_or(ConfigError::Missing("ACCESS_TOKEN_EXPIRE_MINUTES"))?;
        let access_token_expire_minutes = raw_ttl
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|m| *m > 0)
            .ok_or_else(|| {
                ConfigError::invalid(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    &raw_ttl,
                    "expected a positive number of minutes",
                )
            })?;
        // Tokens must carry a representable expiry timestamp.
        Duration::try_minutes(access_token_expire_minutes)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                ConfigError::invalid(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    &raw_ttl,
                    "token lifetime is too large",
                )
            })?;

        Ok(Self {
            admin_username,
            admin_password,
            secret_key,
            algorithm,
            access_token_expire_minutes,
        })
    }
}

impl SheetsConfig {
    fn defaults(http_timeout_secs: u64) -> Self {
        Self {
            credentials_file: PathBuf::from("credentials/credentials.json"),
            share_with_email: None,
            share_role: "writer".to_string(),
            sheets_api_base_url: "https://sheets.googleapis.com/".to_string(),
            drive_api_base_url: "https://www.googleapis.com/drive/v3/".to_string(),
            http_timeout_secs,
        }
    }
}
